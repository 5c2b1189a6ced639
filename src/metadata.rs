//! Request description passed to the executor.

use http::{HeaderMap, HeaderName, HeaderValue};

/// Everything needed to issue one GET against the directory API.
///
/// The request goes to `{origin}/v{version}{path}?{query}`. Query parameters
/// keep the order they were added in.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The resource path, e.g. `/servers/123`.
    pub path: String,

    /// The API version literal.
    pub version: u64,

    /// Additional headers for this request.
    pub headers: HeaderMap,

    /// Query parameters, in order.
    pub query_params: Vec<(String, String)>,
}

impl RequestMetadata {
    /// Creates metadata for `path` under API `version`.
    pub fn new(path: impl Into<String>, version: u64) -> Self {
        Self {
            path: path.into(),
            version,
            headers: HeaderMap::new(),
            query_params: Vec::new(),
        }
    }

    /// The versioned endpoint, e.g. `/v1/servers`.
    pub fn endpoint(&self) -> String {
        format!("/v{}{}", self.version, self.path)
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sends `token` verbatim as the `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value.
    pub fn with_authorization(self, token: &str) -> Result<Self, crate::Error> {
        self.with_header(http::header::AUTHORIZATION.as_str(), token)
    }

    /// Appends a query parameter.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.push((key.into(), value.to_string()));
        self
    }

    /// Appends a query parameter only when there is a value.
    pub fn with_optional_query_param(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with_query_param(key, value),
            None => self,
        }
    }
}
