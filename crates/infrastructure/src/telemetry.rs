//! Tracing setup.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors from installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback filter does not parse.
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs a stderr subscriber.
///
/// A valid `RUST_LOG` wins over `default_filter`.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = resolve_filter(from_env.as_deref(), default_filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

fn resolve_filter(from_env: Option<&str>, default_filter: &str) -> Result<EnvFilter, ParseError> {
    if let Some(filter) = from_env.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(default_filter)
}
