//! Lexo Domain - Core session types
//!
//! This crate defines the domain model for the Lexo session client:
//! token pairs, the API response envelope, the authentication endpoints
//! and the request/response specifications the client passes around.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod envelope;
pub mod error;
pub mod notification;
pub mod request;
pub mod response;

pub use auth::{
    AuthData, AuthEndpoint, Credentials, GoogleCredential, PasswordReset, RefreshPhase,
    RefreshRequest, Registration, SignInOutcome, TokenPair, UserProfile, token_preview,
};
pub use envelope::{ApiEnvelope, ApiFailure, UNAUTHORIZED};
pub use error::{DomainError, DomainResult};
pub use notification::NotificationLevel;
pub use request::{AUTHORIZATION, DEFAULT_TIMEOUT_MS, Header, Headers, HttpMethod, RequestSpec};
pub use response::ResponseSpec;
