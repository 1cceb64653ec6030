//! HTTP Client port

use std::future::Future;
use std::pin::Pin;

use lexo_domain::{RequestSpec, ResponseSpec};
use thiserror::Error;

/// Transport-level failures: the request produced no HTTP response.
///
/// These never trigger a token refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpClientError {
    /// The target URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The timeout elapsed before the response arrived.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// Host that failed to resolve
        host: String,
        /// Resolver message
        message: String,
    },

    /// The server refused the connection.
    #[error("Connection refused: {host}:{port}")]
    ConnectionRefused {
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// The connection failed for another reason.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for executing HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing the
/// session logic to be independent of specific HTTP libraries. It is
/// object safe so the client can hold an `Arc<dyn HttpClient>`.
pub trait HttpClient: Send + Sync {
    /// Executes a request and returns the raw response.
    ///
    /// Non-2xx responses are returned as `Ok`; classifying them is the
    /// caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received (network failure,
    /// timeout, invalid URL).
    fn execute(
        &self,
        request: &RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>>;
}
