//! Lexo Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration and logging setup.

pub mod adapters;
pub mod persistence;
pub mod serialization;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use adapters::{ReqwestHttpClient, TracingNotifier};
pub use persistence::{FileTokenPersistence, MemoryTokenPersistence};
pub use serialization::{
    SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes,
};
pub use session::{AuthStatus, SessionState};
pub use settings::{ClientConfig, ConfigError, DEFAULT_BASE_URL, default_token_path};
pub use telemetry::{TelemetryError, init_tracing};
