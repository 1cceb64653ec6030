//! Application error types

use lexo_domain::{ApiFailure, DomainError};
use thiserror::Error;

use crate::ports::HttpClientError;

/// Errors returned to callers of the authenticated client.
///
/// `Api` carries the server's failure unchanged, so callers can branch on
/// the application status and message.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The request was malformed or the response could not be decoded.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The request never produced a response (network, DNS, timeout).
    #[error(transparent)]
    Transport(#[from] HttpClientError),

    /// The server answered with a failure envelope.
    #[error("{0}")]
    Api(ApiFailure),
}

impl ClientError {
    /// Returns the server failure, if this is one.
    #[must_use]
    pub const fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Api(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the application status of a server failure.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(failure) => Some(failure.status),
            _ => None,
        }
    }

    /// Returns true when the server reported an application-level `401`.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(failure) if failure.is_unauthorized())
    }
}

impl From<ApiFailure> for ClientError {
    fn from(failure: ApiFailure) -> Self {
        Self::Api(failure)
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Why a token refresh did not produce a new pair.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// There is no refresh token to exchange.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh call did not reach the server.
    #[error("refresh request failed: {0}")]
    Transport(HttpClientError),

    /// The server refused the refresh token.
    #[error("refresh rejected: {0}")]
    Rejected(ApiFailure),

    /// The refresh response carried no usable tokens.
    #[error("refresh response is invalid: {0}")]
    InvalidResponse(String),

    /// The session was signed out while the refresh ran.
    #[error("session ended while refreshing")]
    Superseded,
}
