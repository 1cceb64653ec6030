//! Typed authentication operations.

use lexo_domain::{
    ApiEnvelope, AuthData, AuthEndpoint, Credentials, DomainError, GoogleCredential,
    PasswordReset, RefreshRequest, Registration, RequestSpec, SignInOutcome,
};
use serde::Serialize;
use tracing::info;

use super::client::AuthenticatedClient;
use super::session_tokens::TokenStatus;
use crate::error::ClientResult;
use crate::ports::PersistenceError;

/// Sign-in, sign-up and sign-out on top of an [`AuthenticatedClient`].
///
/// Storing and clearing tokens happens inside the client; these methods
/// only build the requests and shape the results.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: AuthenticatedClient,
}

impl AuthApi {
    /// Creates the API over a shared client.
    #[must_use]
    pub const fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Loads persisted tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted tokens cannot be read.
    pub async fn restore_session(&self) -> Result<TokenStatus, PersistenceError> {
        self.client.restore_session().await
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the server failure, a transport error, or a decode error when
    /// the response carries no auth payload.
    pub async fn sign_in(&self, credentials: &Credentials) -> ClientResult<SignInOutcome> {
        self.authenticate(AuthEndpoint::SignIn, credentials).await
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// As [`Self::sign_in`].
    pub async fn sign_up(&self, registration: &Registration) -> ClientResult<SignInOutcome> {
        self.authenticate(AuthEndpoint::SignUp, registration).await
    }

    /// Signs in with a Google ID token.
    ///
    /// # Errors
    ///
    /// As [`Self::sign_in`].
    pub async fn authenticate_google(&self, id_token: &str) -> ClientResult<SignInOutcome> {
        let credential = GoogleCredential {
            id_token: id_token.to_string(),
        };
        self.authenticate(AuthEndpoint::GoogleAuth, &credential).await
    }

    /// Revokes the refresh token and ends the session.
    ///
    /// Local tokens are cleared on success and on a `401`.
    ///
    /// # Errors
    ///
    /// Returns the server failure or a transport error.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let refresh_token = self
            .client
            .tokens()
            .await
            .map(|pair| pair.refresh_token)
            .unwrap_or_default();
        let request = RequestSpec::post(AuthEndpoint::SignOut.path())
            .with_json(&RefreshRequest { refresh_token })?;

        self.client.send(request).await?;
        Ok(())
    }

    /// Requests a reset code, or sets a new password with one.
    ///
    /// Returns the server's message.
    ///
    /// # Errors
    ///
    /// Returns the server failure or a transport error.
    pub async fn reset_password(&self, reset: &PasswordReset) -> ClientResult<String> {
        let request = RequestSpec::post(AuthEndpoint::ResetPassword.path()).with_json(reset)?;
        let envelope: ApiEnvelope<serde::de::IgnoredAny> = self.client.send_json(request).await?;
        Ok(envelope.message)
    }

    async fn authenticate<B: Serialize + Sync>(
        &self,
        endpoint: AuthEndpoint,
        body: &B,
    ) -> ClientResult<SignInOutcome> {
        let request = RequestSpec::post(endpoint.path()).with_json(body)?;
        let envelope: ApiEnvelope<AuthData> = self.client.send_json(request).await?;

        let data = envelope
            .data
            .ok_or_else(|| DomainError::Decode(format!("{endpoint} response has no data")))?;
        if !data.no_password && data.session_tokens().is_none() {
            return Err(DomainError::Decode(format!("{endpoint} response has no tokens")).into());
        }

        let outcome = data.outcome();
        info!(%endpoint, established = outcome.is_established(), "authenticated");
        Ok(outcome)
    }
}
