//! Lexo Application - Session handling and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for transport, token persistence and
//!   session notifications)
//! - The authenticated client with single-flight token refresh
//! - Typed authentication operations (sign-in, sign-out, ...)

pub mod auth;
pub mod error;
pub mod ports;

pub use auth::{
    AuthApi, AuthenticatedClient, RefreshCoordinator, RefreshTicket, SESSION_EXPIRED_MESSAGE,
    SessionTokens, TokenStatus,
};
pub use error::{ClientError, ClientResult, RefreshError};
pub use ports::{
    AuthStateSink, HttpClient, HttpClientError, Notifier, PersistenceError, TokenPersistence,
};
