//! Turns an HTTP response into success, a rate limit, or an API failure.
//!
//! The directory API embeds its own status in a `code` field of the JSON body,
//! so a `200 OK` can still carry a failure. Throttling is the one signal read
//! from the HTTP layer: a `429` is classified before the body is looked at.

use crate::{rate_limit::RateLimit, Error, Result};
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// Checks for throttling. Runs before the body is decoded.
pub(crate) fn check_rate_limit(
    status: StatusCode,
    headers: &HeaderMap,
    version: u64,
    path: &str,
) -> Result<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited(RateLimit::from_headers(
            headers, version, path,
        )));
    }
    Ok(())
}

/// Checks the body's embedded `code`, returning the body when it signals success.
pub(crate) fn check_body(status: StatusCode, body: Value) -> Result<Value> {
    match body.get("code") {
        Some(code) if is_present(code) && !is_success_code(code) => {
            let message = match body.get("message") {
                Some(Value::String(message)) => message.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            Err(Error::RequestFailed { status, message })
        }
        _ => Ok(body),
    }
}

/// Full classification of a decoded response.
pub fn classify(
    status: StatusCode,
    headers: &HeaderMap,
    body: Value,
    version: u64,
    path: &str,
) -> Result<Value> {
    check_rate_limit(status, headers, version, path)?;
    check_body(status, body)
}

/// `null`, `false`, `0` and `""` mean the API sent no code at all.
fn is_present(code: &Value) -> bool {
    match code {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn is_success_code(code: &Value) -> bool {
    let numeric = match code {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    matches!(numeric, Some(200..=299))
}
