//! A classified, successful API response.

use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// A response that passed classification: not throttled, and no failure code
/// in its body.
///
/// Keeps the decoded body next to the raw text so mapping failures can report
/// exactly what the API sent.
#[derive(Debug, Clone)]
pub struct Payload {
    /// The decoded JSON body.
    pub body: Value,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl Payload {
    /// Wraps a mapping failure with this response's status and body.
    pub(crate) fn decode_error(&self, error: serde_json::Error) -> crate::Error {
        tracing::debug!(
            error = %error,
            raw_response = %self.raw_body,
            "Failed to map response"
        );
        crate::Error::DeserializationFailed {
            raw_response: self.raw_body.clone(),
            serde_error: error.to_string(),
            status: self.status,
        }
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}
