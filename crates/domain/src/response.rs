//! Response specification type

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{DomainError, DomainResult};

/// A raw HTTP response as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSpec {
    /// Transport status code
    pub status: u16,
    /// Response headers (lower-cased names)
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
    /// Time from send to last byte
    pub duration: Duration,
}

impl ResponseSpec {
    /// Creates a new response.
    #[must_use]
    pub const fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: Vec<u8>,
        duration: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            duration,
        }
    }

    /// Creates a response with a JSON body and no headers.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(
            status,
            HashMap::from([("content-type".to_string(), "application/json".to_string())]),
            body.to_string().into_bytes(),
            Duration::ZERO,
        )
    }

    /// Returns true for a 2xx transport status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> DomainResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| DomainError::Decode(e.to_string()))
    }
}
