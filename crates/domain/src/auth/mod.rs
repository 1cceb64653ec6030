//! Authentication domain types

mod endpoint;
mod requests;
mod session;
mod token;

pub use endpoint::AuthEndpoint;
pub use requests::{Credentials, GoogleCredential, PasswordReset, RefreshRequest, Registration};
pub use session::{RefreshPhase, SignInOutcome};
pub use token::{AuthData, TokenPair, UserProfile, token_preview};
