//! Authenticated HTTP client.
//!
//! Every request is stamped with the current access token. When the server
//! answers with the application status `401`, the client refreshes the token
//! pair (one refresh for any number of concurrent failures), replays the
//! request once with the new token, and ends the session when the refresh
//! itself fails.
//!
//! # Failure contract
//!
//! When a refresh fails, every request waiting on it gets back its own
//! original `401` failure as [`ClientError::Api`]; the refresh error is
//! logged and reported to the user through the [`Notifier`]. When the refresh
//! succeeds but the replayed request fails, the replay's error is returned.

use std::sync::Arc;

use futures_util::future::FutureExt;
use lexo_domain::{
    ApiEnvelope, ApiFailure, AuthData, AuthEndpoint, NotificationLevel, RefreshPhase,
    RefreshRequest, RequestSpec, ResponseSpec, TokenPair,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::refresh::{RefreshCoordinator, RefreshResult, RefreshTicket};
use super::session_tokens::{SessionTokens, TokenStatus};
use crate::error::{ClientError, ClientResult, RefreshError};
use crate::ports::{AuthStateSink, HttpClient, Notifier, PersistenceError, TokenPersistence};

/// Message shown to the user when a refresh fails and the session ends.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// HTTP client that keeps the session alive.
///
/// Construct one per process and clone it freely; clones share tokens and
/// refresh state.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Arc<dyn HttpClient>,
    tokens: SessionTokens,
    refresh: RefreshCoordinator,
    auth_sink: Arc<dyn AuthStateSink>,
    notifier: Arc<dyn Notifier>,
}

impl AuthenticatedClient {
    /// Creates a client with no session. Call [`Self::restore_session`] to
    /// pick up persisted tokens.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        persistence: Arc<dyn TokenPersistence>,
        auth_sink: Arc<dyn AuthStateSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http,
                tokens: SessionTokens::new(persistence),
                refresh: RefreshCoordinator::new(),
                auth_sink,
                notifier,
            }),
        }
    }

    /// Loads persisted tokens into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted tokens cannot be read.
    pub async fn restore_session(&self) -> Result<TokenStatus, PersistenceError> {
        if self.inner.tokens.restore().await?.is_some() {
            info!("restored persisted session");
            self.inner.auth_sink.notify_signed_in(None);
        }
        Ok(self.inner.tokens.status().await)
    }

    /// Returns the current token pair.
    pub async fn tokens(&self) -> Option<TokenPair> {
        self.inner.tokens.get().await
    }

    /// Returns the current access token.
    pub async fn access_token(&self) -> Option<String> {
        self.inner.tokens.access_token().await
    }

    /// Returns the session status for display.
    pub async fn status(&self) -> TokenStatus {
        self.inner.tokens.status().await
    }

    /// Returns the refresh state machine's phase.
    #[must_use]
    pub fn refresh_phase(&self) -> RefreshPhase {
        self.inner.refresh.phase()
    }

    /// Sends a request, refreshing the session and replaying once on `401`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when no response arrived,
    /// [`ClientError::Api`] with the server's failure otherwise.
    pub async fn send(&self, mut request: RequestSpec) -> ClientResult<ResponseSpec> {
        request.validate()?;
        let endpoint = AuthEndpoint::classify(request.route());
        self.inner.stamp(&mut request).await;
        let epoch = self.inner.refresh.epoch();

        debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            "sending request"
        );

        match self.inner.dispatch(&request).await {
            Ok(response) => {
                self.inner.after_success(endpoint, &response).await;
                Ok(response)
            }
            Err(ClientError::Api(failure)) if failure.is_unauthorized() => {
                self.recover(endpoint, request, epoch, failure).await
            }
            Err(error) => Err(error),
        }
    }

    /// Sends a request and decodes the success envelope.
    ///
    /// # Errors
    ///
    /// As [`Self::send`], plus [`ClientError::Domain`] when the body does
    /// not decode into the envelope.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestSpec,
    ) -> ClientResult<ApiEnvelope<T>> {
        let response = self.send(request).await?;
        Ok(response.decode()?)
    }

    async fn recover(
        &self,
        endpoint: Option<AuthEndpoint>,
        mut request: RequestSpec,
        epoch: u64,
        failure: ApiFailure,
    ) -> ClientResult<ResponseSpec> {
        if endpoint == Some(AuthEndpoint::SignOut) {
            self.inner.tokens.clear().await;
        }

        if request.retried || endpoint.is_some_and(AuthEndpoint::skips_refresh) {
            debug!(request_id = %request.id, path = %request.path, "401 is not retried");
            return Err(ClientError::Api(failure));
        }

        if self.inner.refresh.is_failed() {
            self.inner.force_sign_out().await;
            return Err(ClientError::Api(failure));
        }

        request.retried = true;

        // Sent with a token that has since been replaced: the refresh this
        // request needs already happened.
        let sent_with = request.headers.bearer().map(str::to_owned);
        if let Some(current) = self.inner.tokens.access_token().await
            && sent_with.as_deref() != Some(current.as_str())
        {
            debug!(request_id = %request.id, "replaying with the current token");
            return self.replay(endpoint, request, &current).await;
        }

        let ticket = self.inner.refresh.begin(epoch, |generation| {
            Arc::clone(&self.inner).refresh_tokens(generation).boxed()
        });
        let handle = match ticket {
            RefreshTicket::Started(handle) => {
                debug!(request_id = %request.id, "started token refresh");
                handle
            }
            RefreshTicket::Joined(handle) => {
                debug!(request_id = %request.id, "joined running token refresh");
                handle
            }
            RefreshTicket::AlreadyRefreshed => {
                return match self.inner.tokens.access_token().await {
                    Some(current) => self.replay(endpoint, request, &current).await,
                    None => Err(ClientError::Api(failure)),
                };
            }
            RefreshTicket::SessionFailed => {
                self.inner.force_sign_out().await;
                return Err(ClientError::Api(failure));
            }
        };

        match handle.await {
            Ok(access_token) => self.replay(endpoint, request, &access_token).await,
            Err(error) => {
                debug!(request_id = %request.id, %error, "refresh failed; returning original failure");
                Err(ClientError::Api(failure))
            }
        }
    }

    async fn replay(
        &self,
        endpoint: Option<AuthEndpoint>,
        mut request: RequestSpec,
        access_token: &str,
    ) -> ClientResult<ResponseSpec> {
        request.headers.set_bearer(access_token);
        debug!(request_id = %request.id, path = %request.path, "replaying request");
        let response = self.inner.dispatch(&request).await?;
        self.inner.after_success(endpoint, &response).await;
        Ok(response)
    }
}

impl ClientInner {
    async fn stamp(&self, request: &mut RequestSpec) {
        if let Some(token) = self.tokens.access_token().await {
            request.headers.set_bearer(&token);
        }
    }

    async fn dispatch(&self, request: &RequestSpec) -> ClientResult<ResponseSpec> {
        let response = self.http.execute(request).await?;
        match ApiFailure::from_response(&response) {
            Some(failure) => Err(ClientError::Api(failure)),
            None => Ok(response),
        }
    }

    async fn after_success(&self, endpoint: Option<AuthEndpoint>, response: &ResponseSpec) {
        match endpoint {
            Some(endpoint) if endpoint.issues_session() => {
                match response.decode::<ApiEnvelope<AuthData>>() {
                    Ok(ApiEnvelope {
                        data: Some(data), ..
                    }) => self.establish_session(&data).await,
                    Ok(_) => debug!(%endpoint, "response carried no session data"),
                    Err(error) => warn!(%endpoint, %error, "could not read session data"),
                }
            }
            Some(AuthEndpoint::SignOut) => {
                self.tokens
                    .clear_if(|| {
                        self.refresh.reset();
                        true
                    })
                    .await;
                self.auth_sink.notify_signed_out();
                info!("signed out");
            }
            _ => {}
        }
    }

    async fn establish_session(&self, data: &AuthData) {
        let Some(pair) = data.session_tokens() else {
            if data.no_password {
                info!("account has no password yet; session not stored");
            }
            return;
        };

        self.tokens
            .store_if(pair, || {
                self.refresh.reset();
                true
            })
            .await;
        self.auth_sink.notify_signed_in(data.user.as_ref());
        info!("session established");
    }

    /// Ends the session after the refresh token is known to be invalid.
    async fn force_sign_out(&self) {
        warn!("refresh previously failed; ending session");
        self.tokens.clear().await;
        self.auth_sink.notify_signed_out();
    }

    /// Runs one refresh. The session is only touched while `generation` is
    /// still installed; a refresh detached by a sign-in or sign-out leaves
    /// the new session alone and hands its waiters the current token.
    async fn refresh_tokens(self: Arc<Self>, generation: u64) -> RefreshResult {
        match self.request_new_tokens().await {
            Ok(pair) => {
                let access_token = pair.access_token.clone();
                if self
                    .tokens
                    .store_if(pair, || self.refresh.settle(generation, true))
                    .await
                {
                    info!("access token refreshed");
                    return Ok(access_token);
                }
            }
            Err(error) => {
                if self
                    .tokens
                    .clear_if(|| self.refresh.settle(generation, false))
                    .await
                {
                    warn!(%error, "token refresh failed; ending session");
                    self.auth_sink.notify_signed_out();
                    self.notifier
                        .notify(SESSION_EXPIRED_MESSAGE, NotificationLevel::Warning);
                    return Err(error);
                }
                debug!(%error, "detached refresh failed");
            }
        }

        debug!(generation, "refresh outcome discarded; session changed meanwhile");
        self.tokens
            .access_token()
            .await
            .ok_or(RefreshError::Superseded)
    }

    async fn request_new_tokens(&self) -> Result<TokenPair, RefreshError> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .await
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = RequestSpec::post(AuthEndpoint::RefreshToken.path())
            .with_json(&RefreshRequest {
                refresh_token: refresh_token.clone(),
            })
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        let response = self
            .http
            .execute(&request)
            .await
            .map_err(RefreshError::Transport)?;

        if let Some(failure) = ApiFailure::from_response(&response) {
            return Err(RefreshError::Rejected(failure));
        }

        let envelope: ApiEnvelope<AuthData> = response
            .decode()
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        let data = envelope
            .data
            .filter(|data| !data.access_token.is_empty())
            .ok_or_else(|| RefreshError::InvalidResponse("missing access token".to_string()))?;

        // Servers that do not rotate refresh tokens omit the field.
        let refresh_token = if data.refresh_token.is_empty() {
            refresh_token
        } else {
            data.refresh_token
        };
        Ok(TokenPair::new(data.access_token, refresh_token))
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("tokens", &self.inner.tokens)
            .field("refresh", &self.inner.refresh)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::test_support::{Harness, ScriptedHttpClient, expired, ok, tokens};
    use crate::ports::HttpClientError;
    use futures_util::future::join_all;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{Barrier, Notify};

    fn signed_in() -> Option<TokenPair> {
        Some(TokenPair::new("T1", "S1"))
    }

    /// `/lessons` accepts only `T2`; `/refresh-token` issues `T2`/`S2`.
    fn refreshing_server() -> ScriptedHttpClient {
        ScriptedHttpClient::new(|request: RequestSpec| async move {
            match request.route() {
                "/refresh-token" => {
                    tokio::task::yield_now().await;
                    Ok(ok(tokens("T2", "S2")))
                }
                _ if request.headers.bearer() == Some("T2") => Ok(ok(json!({ "lessons": [] }))),
                _ => Ok(expired()),
            }
        })
    }

    #[tokio::test]
    async fn test_request_is_stamped_with_access_token() {
        let harness = Harness::new(refreshing_server(), Some(TokenPair::new("T2", "S2"))).await;

        harness.client.send(RequestSpec::get("/lessons")).await.unwrap();

        let calls = harness.http.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].headers.get("Authorization"), Some("Bearer T2"));
    }

    #[tokio::test]
    async fn test_request_without_session_has_no_authorization_header() {
        let http = ScriptedHttpClient::new(|_| async { Ok(ok(json!([]))) });
        let harness = Harness::new(http, None).await;

        harness.client.send(RequestSpec::get("/courses")).await.unwrap();

        assert_eq!(harness.http.calls()[0].headers.get("Authorization"), None);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_request_replayed() {
        let harness = Harness::new(refreshing_server(), signed_in()).await;

        let response = harness.client.send(RequestSpec::get("/lessons")).await.unwrap();

        assert_eq!(response.status, 200);
        let lessons = harness.http.calls_to("/lessons");
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].headers.bearer(), Some("T1"));
        assert_eq!(lessons[1].headers.bearer(), Some("T2"));
        assert!(lessons[1].retried);

        let refresh = harness.http.calls_to("/refresh-token");
        assert_eq!(refresh.len(), 1);
        assert_eq!(refresh[0].body, Some(json!({ "refreshToken": "S1" })));

        assert_eq!(harness.persistence.snapshot(), Some(TokenPair::new("T2", "S2")));
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_requests_share_one_refresh() {
        const REQUESTS: usize = 5;
        let barrier = Arc::new(Barrier::new(REQUESTS));
        let http = ScriptedHttpClient::new(move |request: RequestSpec| {
            let barrier = Arc::clone(&barrier);
            async move {
                match request.route() {
                    "/refresh-token" => {
                        tokio::task::yield_now().await;
                        Ok(ok(tokens("T2", "S2")))
                    }
                    _ if request.headers.bearer() == Some("T2") => Ok(ok(json!({}))),
                    _ => {
                        // Hold every first attempt until all of them are in flight.
                        barrier.wait().await;
                        Ok(expired())
                    }
                }
            }
        });
        let harness = Harness::new(http, signed_in()).await;

        let sends = (0..REQUESTS).map(|i| harness.client.send(RequestSpec::get(format!("/lessons/{i}"))));
        let results = join_all(sends).await;

        assert!(results.iter().all(Result::is_ok));
        let calls = harness.http.calls();
        let refreshes = calls.iter().filter(|r| r.route() == "/refresh-token").count();
        assert_eq!(refreshes, 1);

        let replays: Vec<_> = calls.iter().filter(|r| r.retried).collect();
        assert_eq!(replays.len(), REQUESTS);
        assert!(replays.iter().all(|r| r.headers.bearer() == Some("T2")));
        assert_eq!(harness.client.access_token().await.as_deref(), Some("T2"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_refresh_on_multi_threaded_runtime() {
        const REQUESTS: usize = 8;
        let refreshes = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(REQUESTS));
        let counter = Arc::clone(&refreshes);
        let http = ScriptedHttpClient::new(move |request: RequestSpec| {
            let barrier = Arc::clone(&barrier);
            let counter = Arc::clone(&counter);
            async move {
                match request.route() {
                    "/refresh-token" => {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(ok(tokens("T2", "S2")))
                    }
                    _ if request.headers.bearer() == Some("T2") => Ok(ok(json!({}))),
                    _ => {
                        barrier.wait().await;
                        Ok(expired())
                    }
                }
            }
        });
        let harness = Harness::new(http, signed_in()).await;

        let tasks: Vec<_> = (0..REQUESTS)
            .map(|_| {
                let client = harness.client.clone();
                tokio::spawn(async move { client.send(RequestSpec::get("/posts")).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scenario_two_requests_one_refresh() {
        let harness = Harness::new(refreshing_server(), signed_in()).await;

        let (a, b) = tokio::join!(
            harness.client.send(RequestSpec::get("/lessons/a")),
            harness.client.send(RequestSpec::get("/lessons/b")),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(harness.http.calls_to("/refresh-token").len(), 1);
        for route in ["/lessons/a", "/lessons/b"] {
            let calls = harness.http.calls_to(route);
            assert_eq!(calls.last().unwrap().headers.get("Authorization"), Some("Bearer T2"));
        }
        assert_eq!(harness.persistence.snapshot().unwrap().access_token, "T2");
    }

    #[tokio::test]
    async fn test_replayed_request_is_not_retried_again() {
        let http = ScriptedHttpClient::new(|request: RequestSpec| async move {
            match request.route() {
                "/refresh-token" => Ok(ok(tokens("T2", "S2"))),
                _ => Ok(expired()),
            }
        });
        let harness = Harness::new(http, signed_in()).await;

        let error = harness.client.send(RequestSpec::get("/orders")).await.unwrap_err();

        assert!(error.is_unauthorized());
        assert_eq!(harness.http.calls_to("/orders").len(), 2);
        assert_eq!(harness.http.calls_to("/refresh-token").len(), 1);
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_request_marked_retried_is_never_refreshed() {
        let harness = Harness::new(refreshing_server(), signed_in()).await;
        let mut request = RequestSpec::get("/lessons");
        request.retried = true;

        let error = harness.client.send(request).await.unwrap_err();

        assert!(error.is_unauthorized());
        assert!(harness.http.calls_to("/refresh-token").is_empty());
    }

    #[tokio::test]
    async fn test_excluded_endpoints_never_refresh() {
        for path in ["/sign-in", "/sign-out", "/refresh-token", "/reset-password"] {
            let http = ScriptedHttpClient::new(|_| async { Ok(expired()) });
            let harness = Harness::new(http, signed_in()).await;

            let error = harness.client.send(RequestSpec::post(path)).await.unwrap_err();

            assert!(error.is_unauthorized(), "{path}");
            assert_eq!(harness.http.calls().len(), 1, "{path}");
            assert_eq!(harness.sink.signed_out(), 0, "{path}");
        }
    }

    #[tokio::test]
    async fn test_sign_out_unauthorized_clears_tokens() {
        let http = ScriptedHttpClient::new(|_| async { Ok(expired()) });
        let harness = Harness::new(http, signed_in()).await;

        let error = harness.client.send(RequestSpec::post("/sign-out")).await.unwrap_err();

        assert!(error.is_unauthorized());
        assert_eq!(harness.client.tokens().await, None);
        assert_eq!(harness.persistence.snapshot(), None);
    }

    #[tokio::test]
    async fn test_refresh_network_failure_ends_session() {
        let http = ScriptedHttpClient::new(|request: RequestSpec| async move {
            match request.route() {
                "/refresh-token" => Err(HttpClientError::ConnectionFailed("reset by peer".into())),
                _ => Ok(expired()),
            }
        });
        let harness = Harness::new(http, signed_in()).await;

        let error = harness.client.send(RequestSpec::get("/flashcards")).await.unwrap_err();

        // The caller sees its own 401, not the refresh error.
        let failure = error.failure().unwrap();
        assert_eq!(failure.status, 401);
        assert_eq!(failure.message, "jwt expired");

        assert_eq!(harness.client.tokens().await, None);
        assert_eq!(harness.persistence.snapshot(), None);
        assert_eq!(harness.sink.signed_out(), 1);
        assert_eq!(
            harness.notifier.messages(),
            vec![(SESSION_EXPIRED_MESSAGE.to_string(), NotificationLevel::Warning)]
        );
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Failed);
        assert_eq!(harness.http.calls_to("/flashcards").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_short_circuits_until_sign_in() {
        let http = ScriptedHttpClient::new(|request: RequestSpec| async move {
            match request.route() {
                "/refresh-token" => Ok(ResponseSpec::json(
                    401,
                    &json!({ "status": 401, "message": "invalid refresh token" }),
                )),
                "/sign-in" => Ok(ok(tokens("T5", "S5"))),
                _ => Ok(expired()),
            }
        });
        let harness = Harness::new(http, signed_in()).await;

        harness.client.send(RequestSpec::get("/dictations")).await.unwrap_err();
        assert_eq!(harness.http.calls_to("/refresh-token").len(), 1);

        let error = harness.client.send(RequestSpec::get("/dictations")).await.unwrap_err();
        assert!(error.is_unauthorized());
        assert_eq!(harness.http.calls_to("/refresh-token").len(), 1);
        assert_eq!(harness.sink.signed_out(), 2);
        assert_eq!(harness.notifier.messages().len(), 1);

        harness.client.send(RequestSpec::post("/sign-in")).await.unwrap();
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Idle);

        harness.client.send(RequestSpec::get("/dictations")).await.unwrap_err();
        assert_eq!(harness.http.calls_to("/refresh-token").len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_fail_together_when_refresh_fails() {
        let barrier = Arc::new(Barrier::new(3));
        let http = ScriptedHttpClient::new(move |request: RequestSpec| {
            let barrier = Arc::clone(&barrier);
            async move {
                match request.route() {
                    "/refresh-token" => {
                        tokio::task::yield_now().await;
                        Err(HttpClientError::Timeout { timeout_ms: 10_000 })
                    }
                    _ => {
                        barrier.wait().await;
                        Ok(expired())
                    }
                }
            }
        });
        let harness = Harness::new(http, signed_in()).await;

        let results = join_all((0..3).map(|_| harness.client.send(RequestSpec::get("/posts")))).await;

        assert!(results.iter().all(|r| r.as_ref().is_err_and(ClientError::is_unauthorized)));
        assert_eq!(harness.http.calls_to("/refresh-token").len(), 1);
        assert_eq!(harness.http.calls_to("/posts").len(), 3);
        assert_eq!(harness.notifier.messages().len(), 1);
        assert_eq!(harness.client.tokens().await, None);
    }

    /// `/refresh-token` waits for `gate` and then answers with `refresh`;
    /// `/sign-in` issues `T5`/`S5`, which `/lessons` accepts.
    fn gated_refresh_server(gate: Arc<Notify>, refresh: ResponseSpec) -> ScriptedHttpClient {
        ScriptedHttpClient::new(move |request: RequestSpec| {
            let gate = Arc::clone(&gate);
            let refresh = refresh.clone();
            async move {
                Ok(match request.route() {
                    "/refresh-token" => {
                        gate.notified().await;
                        refresh
                    }
                    "/sign-in" => ok(tokens("T5", "S5")),
                    _ if request.headers.bearer() == Some("T5") => ok(json!({})),
                    _ => expired(),
                })
            }
        })
    }

    /// Signs in once the refresh is running, then lets the refresh finish.
    async fn sign_in_during_refresh(harness: &Harness, gate: &Notify) {
        while harness.client.refresh_phase() != RefreshPhase::InFlight {
            tokio::task::yield_now().await;
        }
        let sign_in = RequestSpec::post("/sign-in")
            .with_json(&json!({ "email": "amy@example.com", "password": "hunter22" }))
            .unwrap();
        harness.client.send(sign_in).await.unwrap();
        gate.notify_one();
    }

    #[tokio::test]
    async fn test_sign_in_survives_failing_refresh_of_previous_session() {
        let gate = Arc::new(Notify::new());
        let revoked = ResponseSpec::json(200, &json!({ "status": 401, "message": "revoked" }));
        let harness = Harness::new(gated_refresh_server(gate.clone(), revoked), signed_in()).await;

        let (lessons, ()) = tokio::join!(
            harness.client.send(RequestSpec::get("/lessons")),
            sign_in_during_refresh(&harness, &gate),
        );

        assert_eq!(harness.client.tokens().await, Some(TokenPair::new("T5", "S5")));
        assert_eq!(harness.persistence.snapshot(), Some(TokenPair::new("T5", "S5")));
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Idle);
        assert_eq!(harness.sink.signed_out(), 0);
        assert!(harness.notifier.messages().is_empty());

        lessons.unwrap();
        assert_eq!(
            harness.http.calls_to("/lessons").last().unwrap().headers.bearer(),
            Some("T5")
        );
    }

    #[tokio::test]
    async fn test_sign_in_is_not_overwritten_by_refresh_of_previous_session() {
        let gate = Arc::new(Notify::new());
        let harness =
            Harness::new(gated_refresh_server(gate.clone(), ok(tokens("T2", "S2"))), signed_in())
                .await;

        let (lessons, ()) = tokio::join!(
            harness.client.send(RequestSpec::get("/lessons")),
            sign_in_during_refresh(&harness, &gate),
        );

        lessons.unwrap();
        assert_eq!(harness.client.tokens().await, Some(TokenPair::new("T5", "S5")));
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_without_network_call() {
        let http = ScriptedHttpClient::new(|_| async { Ok(expired()) });
        let harness = Harness::new(http, Some(TokenPair::new("T1", ""))).await;

        harness.client.send(RequestSpec::get("/courses")).await.unwrap_err();

        assert!(harness.http.calls_to("/refresh-token").is_empty());
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Failed);
        assert_eq!(harness.sink.signed_out(), 1);
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_not_rotated() {
        let http = ScriptedHttpClient::new(|request: RequestSpec| async move {
            match request.route() {
                "/refresh-token" => Ok(ok(json!({ "accessToken": "T2" }))),
                _ if request.headers.bearer() == Some("T2") => Ok(ok(json!({}))),
                _ => Ok(expired()),
            }
        });
        let harness = Harness::new(http, signed_in()).await;

        harness.client.send(RequestSpec::get("/lessons")).await.unwrap();

        assert_eq!(harness.client.tokens().await, Some(TokenPair::new("T2", "S1")));
    }

    #[tokio::test]
    async fn test_transport_errors_do_not_refresh() {
        let http = ScriptedHttpClient::new(|_| async {
            Err(HttpClientError::Timeout { timeout_ms: 10_000 })
        });
        let harness = Harness::new(http, signed_in()).await;

        let error = harness.client.send(RequestSpec::get("/courses")).await.unwrap_err();

        assert!(matches!(error, ClientError::Transport(HttpClientError::Timeout { .. })));
        assert_eq!(harness.http.calls().len(), 1);
        assert_eq!(harness.client.tokens().await, signed_in());
    }

    #[tokio::test]
    async fn test_other_failures_are_forwarded_unchanged() {
        let http = ScriptedHttpClient::new(|_| async {
            Ok(ResponseSpec::json(404, &json!({ "status": 404, "message": "Course not found" })))
        });
        let harness = Harness::new(http, signed_in()).await;

        let error = harness.client.send(RequestSpec::get("/courses/9")).await.unwrap_err();

        assert_eq!(error.status(), Some(404));
        assert_eq!(error.failure().unwrap().message, "Course not found");
        assert!(harness.http.calls_to("/refresh-token").is_empty());
    }

    #[tokio::test]
    async fn test_invalid_path_is_rejected_before_sending() {
        let harness = Harness::new(refreshing_server(), signed_in()).await;

        let error = harness.client.send(RequestSpec::get("")).await.unwrap_err();

        assert!(matches!(error, ClientError::Domain(_)));
        assert!(harness.http.calls().is_empty());
    }
}
