//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! It resolves request paths against the configured base URL.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use lexo_application::ports::{HttpClient, HttpClientError};
use lexo_domain::{DEFAULT_TIMEOUT_MS, HttpMethod, RequestSpec, ResponseSpec};
use reqwest::{Client, Method, Url};
use tracing::trace;

use crate::settings::ClientConfig;

/// HTTP client implementation using reqwest.
///
/// Wraps `reqwest::Client` and implements the `HttpClient` port from the
/// application layer. Relative request paths are appended to `base_url`.
pub struct ReqwestHttpClient {
    client: Client,
    base_url: String,
    default_timeout_ms: u64,
}

impl ReqwestHttpClient {
    /// Creates a client for the given base URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(concat!("lexo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self::with_client(client, config.base_url.as_str())
            .with_default_timeout_ms(config.timeout_ms))
    }

    /// Creates a client around a custom reqwest client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Sets the timeout used when a request does not carry one.
    #[must_use]
    pub const fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the target URL for a request path.
    fn resolve_url(&self, path: &str) -> Result<Url, HttpClientError> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        Url::parse(&raw).map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {raw}")))
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn host_of(error: &reqwest::Error) -> String {
        error
            .url()
            .and_then(Url::host_str)
            .unwrap_or("unknown")
            .to_string()
    }

    /// Maps reqwest errors to `HttpClientError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let message = error.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return HttpClientError::DnsError {
                    host: Self::host_of(error),
                    message,
                };
            }
            if lowered.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: Self::host_of(error),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(error.to_string())
    }
}

impl std::fmt::Debug for ReqwestHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestHttpClient")
            .field("base_url", &self.base_url)
            .field("default_timeout_ms", &self.default_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: &RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>> {
        let method = request.method;
        let url = self.resolve_url(&request.path);
        let headers = request.headers.clone();
        let body = request.body.clone();
        let timeout_ms = request.timeout_ms.unwrap_or(self.default_timeout_ms);

        Box::pin(async move {
            let url = url?;
            trace!(%method, %url, timeout_ms, "executing request");

            let start = Instant::now();

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(method), url)
                .timeout(Duration::from_millis(timeout_ms));

            for header in headers.iter() {
                builder = builder.header(&header.name, &header.value);
            }

            // `json` also sets Content-Type
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;

            let status = response.status().as_u16();

            let response_headers: HashMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();

            let body_bytes = response
                .bytes()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        HttpClientError::Timeout { timeout_ms }
                    } else {
                        HttpClientError::Other(format!("Failed to read body: {e}"))
                    }
                })?
                .to_vec();

            Ok(ResponseSpec::new(
                status,
                response_headers,
                body_bytes,
                start.elapsed(),
            ))
        })
    }
}
