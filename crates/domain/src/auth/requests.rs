//! Request bodies for the authentication endpoints.

use serde::{Deserialize, Serialize};

/// `POST /sign-in` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// `POST /sign-up` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Display name
    pub full_name: String,
    /// Account email
    pub email: String,
    /// Chosen password
    pub password: String,
}

/// `POST /authenticate/google` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCredential {
    /// ID token issued by Google Sign-In
    pub id_token: String,
}

/// `POST /reset-password` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    /// Account email
    pub email: String,
    /// Reset code sent by email, absent when requesting the code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// New password, absent when requesting the code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

/// `POST /refresh-token` and `POST /sign-out` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token being exchanged or revoked
    pub refresh_token: String,
}
