//! Client settings.
//!
//! Values are layered, later sources winning:
//! 1. built-in defaults
//! 2. `lexo.toml` in the working directory (or the file passed explicitly)
//! 3. `LEXO_*` environment variables (`LEXO_BASE_URL`, `LEXO_TIMEOUT_MS`, ...)

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use lexo_domain::DEFAULT_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "lexo";

const ENV_PREFIX: &str = "LEXO";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the expected shape.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// `base_url` is not an absolute http(s) URL.
    #[error("invalid base_url {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The configured value
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// `timeout_ms` is zero.
    #[error("timeout_ms must be greater than zero")]
    InvalidTimeout,
}

/// Settings for the authenticated client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root every relative request path is appended to
    pub base_url: String,
    /// Per-request timeout when the request sets none
    pub timeout_ms: u64,
    /// Where tokens are stored; the platform config dir when unset
    #[serde(default)]
    pub token_path: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// `User-Agent` header
    pub user_agent: String,
}

impl ClientConfig {
    /// Loads configuration from defaults, an optional file and the environment.
    ///
    /// With `path` the file must exist; without it `lexo.toml` is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or a value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout_ms", DEFAULT_TIMEOUT_MS)?
            .set_default("log_filter", "info")?
            .set_default("user_agent", concat!("lexo/", env!("CARGO_PKG_VERSION")))?
            .add_source(file)
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values the loader cannot.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Returns where tokens are stored.
    #[must_use]
    pub fn resolved_token_path(&self) -> PathBuf {
        self.token_path.clone().unwrap_or_else(default_token_path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            token_path: None,
            log_filter: "info".to_string(),
            user_agent: concat!("lexo/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `<config dir>/lexo/session.json`, or `.lexo/session.json` when the
/// platform has no config dir.
#[must_use]
pub fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .map_or_else(|| PathBuf::from(".lexo"), |dir| dir.join("lexo"))
        .join("session.json")
}
