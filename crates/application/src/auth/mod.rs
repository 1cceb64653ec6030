//! Session handling for the platform API.
//!
//! This module provides:
//! - In-memory token storage mirrored into a persistence port
//! - The single-flight refresh state machine
//! - The authenticated client that stamps, refreshes and replays requests
//! - Typed authentication operations on top of the client

mod api;
mod client;
mod refresh;
mod session_tokens;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::AuthApi;
pub use client::{AuthenticatedClient, SESSION_EXPIRED_MESSAGE};
pub use refresh::{RefreshCoordinator, RefreshResult, RefreshTicket, SharedRefresh};
pub use session_tokens::{SessionTokens, TokenStatus};
