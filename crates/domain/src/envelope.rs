//! The `{ status, message, data }` envelope every platform endpoint returns.
//!
//! The envelope `status` is an application-level code chosen by the server.
//! It is independent of the transport status: a `200 OK` response may carry
//! `"status": 401` when the access token has expired.

use serde::{Deserialize, Serialize};

use crate::response::ResponseSpec;

/// Application status signalling an expired or missing access token.
pub const UNAUTHORIZED: u16 = 401;

/// Success envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Application-level status code
    pub status: u16,
    /// Human-readable message from the server
    #[serde(default)]
    pub message: String,
    /// Payload
    pub data: Option<T>,
}

/// Only the status/message part of an envelope, for classifying failures.
#[derive(Debug, Deserialize)]
struct EnvelopeHead {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

/// A failed API call, kept whole so callers can branch on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    /// Transport status code
    pub transport_status: u16,
    /// Application status from the envelope (transport status if absent)
    pub status: u16,
    /// Server message, empty when the body carried none
    pub message: String,
    /// Raw response body
    pub body: String,
}

impl ApiFailure {
    /// Classifies a response.
    ///
    /// Returns `None` for a success: 2xx transport status and an envelope
    /// status below 400 (or no envelope at all).
    #[must_use]
    pub fn from_response(response: &ResponseSpec) -> Option<Self> {
        let head = response.decode::<EnvelopeHead>().ok();
        let status = head
            .as_ref()
            .and_then(|h| h.status)
            .unwrap_or(response.status);

        if response.is_success() && status < 400 {
            return None;
        }

        Some(Self {
            transport_status: response.status,
            status,
            message: head.and_then(|h| h.message).unwrap_or_default(),
            body: response.text(),
        })
    }

    /// Returns true when the application status is `401`.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == UNAUTHORIZED
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "request failed with status {}", self.status)
        } else {
            write!(f, "{} (status {})", self.message, self.status)
        }
    }
}
