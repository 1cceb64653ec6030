//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session logic and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod http_client;
mod session_events;
mod token_persistence;

pub use http_client::{HttpClient, HttpClientError};
pub use session_events::{AuthStateSink, Notifier};
pub use token_persistence::{PersistenceError, TokenPersistence};
