//! Error types for directory API calls.
//!
//! Every failure a fetch can produce falls into one of four classes:
//!
//! * **usage** - the caller passed something unusable ([`Error::Usage`]); raised
//!   before any network traffic happens.
//! * **rate limited** - the API answered `429` ([`Error::RateLimited`]).
//! * **request failed** - the API reported a failure in its JSON body
//!   ([`Error::RequestFailed`]).
//! * **transport** - the network or the payload itself was broken
//!   ([`Error::Network`], [`Error::DeserializationFailed`]).

use crate::rate_limit::RateLimit;
use http::StatusCode;

/// The main error type for directory API calls.
///
/// # Examples
///
/// ```no_run
/// use servers_space::{Client, Error, FetchOptions};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new()?;
///
/// match client.fetch_guild("123", FetchOptions::new()).await {
///     Ok(guild) => println!("Fetched: {:?}", guild),
///     Err(Error::RateLimited(limit)) => eprintln!("{limit}"),
///     Err(Error::RequestFailed { status, message }) => {
///         eprintln!("API refused the request ({status}): {message}");
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The caller supplied invalid or incomplete input.
    ///
    /// No request was sent.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// The API throttled the request (HTTP 429).
    ///
    /// The wrapped [`RateLimit`] carries the limit and the number of seconds
    /// to wait. This crate never retries on its own.
    #[error("{0}")]
    RateLimited(RateLimit),

    /// The API reported a failure through the `code` field of its JSON body.
    ///
    /// This can happen with any HTTP status, including `200 OK`.
    #[error("{} {message}", .status.as_u16())]
    RequestFailed {
        /// The HTTP status of the response that carried the failure
        status: StatusCode,
        /// The upstream `message` field
        message: String,
    },

    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be decoded or mapped into records.
    ///
    /// Preserves the raw body and the serde message for debugging.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Invalid configuration was provided to the [`ClientBuilder`](crate::ClientBuilder).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Invalid or missing caller input, detected before a request is made.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// An option carried a value of the wrong type.
    #[error("options.{field} must be {expected}.")]
    InvalidOption {
        /// The offending option key, as spelled on the wire (`guildToken`, `page`, ...)
        field: &'static str,
        /// What the key accepts
        expected: &'static str,
    },

    /// Untyped options were not a JSON object.
    #[error("options must be an object.")]
    NotAnObject,

    /// No id was given and the client has no default guild id configured.
    #[error("id must be defined.")]
    MissingId,

    /// An authenticated endpoint was called without a guild token.
    #[error("options.guildToken must be defined.")]
    MissingToken,
}

impl Error {
    /// Returns `true` if the call failed before reaching the network.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// Returns `true` if the API throttled the call.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }

    /// Returns the HTTP status code if this error has one.
    ///
    /// A rate-limited call always reports `429 Too Many Requests`.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::RateLimited(_) => Some(StatusCode::TOO_MANY_REQUESTS),
            Error::RequestFailed { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Returns the rate limit signal if the API throttled the call.
    pub fn rate_limit(&self) -> Option<&RateLimit> {
        match self {
            Error::RateLimited(limit) => Some(limit),
            _ => None,
        }
    }
}

/// A specialized `Result` type for directory API calls.
pub type Result<T> = std::result::Result<T, Error>;
