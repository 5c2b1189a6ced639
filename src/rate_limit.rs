//! Rate limit signal with header parsing.
//!
//! The directory API answers throttled requests with HTTP 429 and two headers:
//! `x-ratelimit-limit` (calls allowed per window) and `retry-after` (window
//! length in seconds). Both are read from their leading digits.

use http::HeaderMap;
use std::fmt;
use std::time::Duration;

/// The API throttled a request.
///
/// Header values that are missing or not integers are kept as `None` rather
/// than failing the parse; they render as `NaN` in the message.
///
/// # Examples
///
/// ```
/// use servers_space::rate_limit::RateLimit;
/// use http::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-ratelimit-limit", "5".parse().unwrap());
/// headers.insert("retry-after", "1".parse().unwrap());
///
/// let limit = RateLimit::from_headers(&headers, 1, "/servers");
/// assert_eq!(limit.limit, Some(5));
/// assert_eq!(
///     limit.to_string(),
///     "Endpoint /v1/servers Ratelimited, 5 times per 1 second"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    /// The throttled endpoint, e.g. `/v1/servers`.
    pub endpoint: String,

    /// How many calls the endpoint allows per window (`x-ratelimit-limit`).
    pub limit: Option<u64>,

    /// Seconds to wait before the limit is lifted (`retry-after`).
    pub retry_after: Option<u64>,
}

impl RateLimit {
    /// Builds the signal for a request to `/v{version}{path}`.
    pub fn from_headers(headers: &HeaderMap, version: u64, path: &str) -> Self {
        Self {
            endpoint: format!("/v{}{}", version, path),
            limit: parse_integer(headers, "x-ratelimit-limit"),
            retry_after: parse_integer(headers, "retry-after"),
        }
    }

    /// How long to wait before calling the endpoint again, if the API said.
    pub fn delay(&self) -> Option<Duration> {
        self.retry_after.map(Duration::from_secs)
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.retry_after == Some(1) { "" } else { "s" };
        write!(
            f,
            "Endpoint {} Ratelimited, {} times per {} second{}",
            self.endpoint,
            Sentinel(self.limit),
            Sentinel(self.retry_after),
            plural
        )
    }
}

/// Renders an unparsed header as `NaN`.
struct Sentinel(Option<u64>);

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => f.write_str("NaN"),
        }
    }
}

/// Reads the leading base-10 digits of a header, so `"5.0"` and `"30, 30"`
/// yield 5 and 30. Anything without a leading digit is `None`.
fn parse_integer(headers: &HeaderMap, name: &str) -> Option<u64> {
    let header = headers.get(name)?.to_str().ok()?.trim_start();
    let unsigned = header.strip_prefix('+').unwrap_or(header);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .map_or(unsigned, |end| &unsigned[..end]);
    digits.parse().ok()
}
