//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The request path is empty or malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A request body could not be encoded as JSON.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
