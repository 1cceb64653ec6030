//! Token pair and the auth payload returned by sign-in and refresh.

use serde::{Deserialize, Serialize};

use super::session::SignInOutcome;

/// Returns a loggable preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) if token.len() > 12 => format!("{}...", &token[..idx]),
        _ => token.to_string(),
    }
}

/// Access and refresh credentials issued together by the server.
///
/// Both values are opaque. `Debug` only prints previews so pairs can be
/// logged safely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer credential
    pub access_token: String,
    /// Longer-lived credential exchanged for a new pair
    pub refresh_token: String,
}

impl TokenPair {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Returns true when there is no access token to send.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }

    /// Returns true when the pair can be exchanged for a new one.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &token_preview(&self.access_token))
            .field("refresh_token", &token_preview(&self.refresh_token))
            .finish()
    }
}

/// Account summary returned alongside tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Account id
    #[serde(default)]
    pub id: String,
    /// Sign-in email
    #[serde(default)]
    pub email: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Role name (`user`, `admin`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// `data` payload of sign-in, sign-up, Google and refresh responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    /// New access token
    #[serde(default)]
    pub access_token: String,
    /// New refresh token
    #[serde(default)]
    pub refresh_token: String,
    /// Signed-in account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    /// The account has no password yet and must create one first.
    #[serde(default)]
    pub no_password: bool,
}

impl AuthData {
    /// Decides what a successful sign-in means for the session.
    #[must_use]
    pub fn outcome(&self) -> SignInOutcome {
        if self.no_password {
            SignInOutcome::RequiresPasswordSetup {
                user: self.user.clone(),
            }
        } else {
            SignInOutcome::SessionEstablished {
                user: self.user.clone(),
            }
        }
    }

    /// Returns the token pair to persist, if this payload grants a session.
    #[must_use]
    pub fn session_tokens(&self) -> Option<TokenPair> {
        if self.no_password || self.access_token.is_empty() {
            return None;
        }
        Some(TokenPair::new(
            self.access_token.clone(),
            self.refresh_token.clone(),
        ))
    }
}
