//! Command execution.

use std::sync::Arc;

use lexo_application::{
    AuthApi, AuthenticatedClient, ClientError, HttpClient, HttpClientError, PersistenceError,
    TokenPersistence,
};
use lexo_domain::{
    Credentials, PasswordReset, Registration, RequestSpec, ResponseSpec, SignInOutcome,
};
use lexo_infrastructure::{
    ClientConfig, FileTokenPersistence, MemoryTokenPersistence, ReqwestHttpClient,
    SerializationError, SessionState, TracingNotifier, to_json_stable,
};
use thiserror::Error;
use tracing::debug;

use crate::cli::Command;

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum AppError {
    /// The API call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The HTTP transport could not be built.
    #[error(transparent)]
    Transport(#[from] HttpClientError),

    /// Stored tokens could not be read.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// `--data` is not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The response could not be printed.
    #[error(transparent)]
    Output(#[from] SerializationError),
}

/// A client bound to one session.
#[derive(Debug)]
pub struct App {
    api: AuthApi,
    session: Arc<SessionState>,
}

impl App {
    /// Builds the client described by `config` and restores its session.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be built or stored tokens
    /// cannot be read.
    pub async fn connect(config: &ClientConfig, ephemeral: bool) -> Result<Self, AppError> {
        let http = Arc::new(ReqwestHttpClient::from_config(config)?);
        let persistence: Arc<dyn TokenPersistence> = if ephemeral {
            Arc::new(MemoryTokenPersistence::new())
        } else {
            let path = config.resolved_token_path();
            debug!(path = %path.display(), "using token file");
            Arc::new(FileTokenPersistence::new(path))
        };
        Self::from_parts(http, persistence).await
    }

    /// Builds the client from explicit collaborators and restores its session.
    ///
    /// # Errors
    ///
    /// Returns an error if stored tokens cannot be read.
    pub async fn from_parts(
        http: Arc<dyn HttpClient>,
        persistence: Arc<dyn TokenPersistence>,
    ) -> Result<Self, AppError> {
        let session = Arc::new(SessionState::new());
        let client = AuthenticatedClient::new(
            http,
            persistence,
            session.clone(),
            Arc::new(TracingNotifier),
        );
        let api = AuthApi::new(client);
        api.restore_session().await?;
        Ok(Self { api, session })
    }

    /// Returns the session state holder.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Returns the authenticated client.
    #[must_use]
    pub const fn client(&self) -> &AuthenticatedClient {
        self.api.client()
    }

    /// Runs one command and returns the text to print.
    ///
    /// # Errors
    ///
    /// Returns the failure of the underlying call.
    pub async fn run(&self, command: Command) -> Result<String, AppError> {
        match command {
            Command::SignIn { email, password } => {
                let outcome = self.api.sign_in(&Credentials { email, password }).await?;
                Ok(describe_outcome(&outcome))
            }
            Command::SignUp {
                name,
                email,
                password,
            } => {
                let registration = Registration {
                    full_name: name,
                    email,
                    password,
                };
                let outcome = self.api.sign_up(&registration).await?;
                Ok(describe_outcome(&outcome))
            }
            Command::Google { id_token } => {
                let outcome = self.api.authenticate_google(&id_token).await?;
                Ok(describe_outcome(&outcome))
            }
            Command::SignOut => {
                self.api.sign_out().await?;
                Ok("Signed out".to_string())
            }
            Command::ResetPassword {
                email,
                code,
                new_password,
            } => {
                let reset = PasswordReset {
                    email,
                    code,
                    new_password,
                };
                Ok(self.api.reset_password(&reset).await?)
            }
            Command::Status => Ok(self.client().status().await.display_message().to_string()),
            Command::Get { path } => self.call(RequestSpec::get(path)).await,
            Command::Post { path, data } => {
                let mut request = RequestSpec::post(path);
                if let Some(data) = data {
                    let body: serde_json::Value = serde_json::from_str(&data)?;
                    request = request.with_json(&body).map_err(ClientError::from)?;
                }
                self.call(request).await
            }
        }
    }

    async fn call(&self, request: RequestSpec) -> Result<String, AppError> {
        let response = self.client().send(request).await?;
        render(&response)
    }
}

fn describe_outcome(outcome: &SignInOutcome) -> String {
    let who = outcome.user().map(|user| user.email.as_str()).filter(|e| !e.is_empty());
    match (outcome, who) {
        (SignInOutcome::SessionEstablished { .. }, Some(email)) => format!("Signed in as {email}"),
        (SignInOutcome::SessionEstablished { .. }, None) => "Signed in".to_string(),
        (SignInOutcome::RequiresPasswordSetup { .. }, _) => {
            "This account has no password yet. Set one with `lexo reset-password`.".to_string()
        }
    }
}

/// Pretty-prints JSON bodies, passes anything else through.
fn render(response: &ResponseSpec) -> Result<String, AppError> {
    match response.decode::<serde_json::Value>() {
        Ok(value) => Ok(to_json_stable(&value)?.trim_end().to_string()),
        Err(_) => Ok(response.text()),
    }
}
