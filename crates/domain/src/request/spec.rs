//! Request specification type

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};

/// Transport timeout applied when neither the request nor the
/// configuration sets one.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Specification of one call against the platform API.
///
/// `path` is relative to the configured base URL (`/courses?page=2`); an
/// absolute `http(s)://` URL is sent as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Correlation id, carried through logs and retries.
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Target path or absolute URL
    pub path: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// JSON body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Timeout for this call in milliseconds; the transport default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Set once the request has been replayed after a token refresh.
    #[serde(default)]
    pub retried: bool,
}

impl RequestSpec {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            headers: Headers::new(),
            body: None,
            timeout_ms: None,
            retried: false,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> DomainResult<Self> {
        let value =
            serde_json::to_value(body).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Overrides the timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Returns the path without query string, fragment or trailing slash.
    #[must_use]
    pub fn route(&self) -> &str {
        let end = self.path.find(['?', '#']).unwrap_or(self.path.len());
        let route = self.path[..end].trim_end_matches('/');
        if route.is_empty() { "/" } else { route }
    }

    /// Validates that the request can be sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is blank or contains whitespace, or a
    /// body is attached to a method that carries none.
    pub fn validate(&self) -> DomainResult<()> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(DomainError::InvalidPath("path is required".to_string()));
        }
        if path.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidPath(format!(
                "path must not contain whitespace: {path}"
            )));
        }
        if self.body.is_some() && !self.method.has_body() {
            return Err(DomainError::InvalidBody(format!(
                "{} requests cannot carry a body",
                self.method
            )));
        }
        Ok(())
    }
}
