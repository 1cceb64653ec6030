//! Scripted collaborators shared by the auth tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use lexo_domain::{NotificationLevel, RequestSpec, ResponseSpec, TokenPair, UserProfile};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::auth::AuthenticatedClient;
use crate::ports::{
    AuthStateSink, HttpClient, HttpClientError, Notifier, PersistenceError, TokenPersistence,
};

type Handler =
    dyn Fn(RequestSpec) -> BoxFuture<'static, Result<ResponseSpec, HttpClientError>> + Send + Sync;

/// HTTP client answering from a closure and recording every request.
pub struct ScriptedHttpClient {
    handler: Box<Handler>,
    calls: Mutex<Vec<RequestSpec>>,
}

impl ScriptedHttpClient {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(RequestSpec) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponseSpec, HttpClientError>> + Send + 'static,
    {
        Self {
            handler: Box::new(move |request| handler(request).boxed()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RequestSpec> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, route: &str) -> Vec<RequestSpec> {
        self.calls
            .lock()
            .iter()
            .filter(|request| request.route() == route)
            .cloned()
            .collect()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute(
        &self,
        request: &RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>> {
        self.calls.lock().push(request.clone());
        (self.handler)(request.clone())
    }
}

/// `200 OK` with a success envelope.
pub fn ok(data: Value) -> ResponseSpec {
    ResponseSpec::json(200, &json!({ "status": 200, "message": "ok", "data": data }))
}

/// Expired-token failure carried in the envelope of a `200 OK`.
pub fn expired() -> ResponseSpec {
    ResponseSpec::json(200, &json!({ "status": 401, "message": "jwt expired" }))
}

/// Auth payload for sign-in and refresh responses.
pub fn tokens(access: &str, refresh: &str) -> Value {
    json!({ "accessToken": access, "refreshToken": refresh })
}

#[derive(Default)]
pub struct InMemoryPersistence {
    pair: Mutex<Option<TokenPair>>,
    fail_writes: AtomicBool,
}

impl InMemoryPersistence {
    pub fn seeded(pair: TokenPair) -> Self {
        Self {
            pair: Mutex::new(Some(pair)),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> Option<TokenPair> {
        self.pair.lock().clone()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenPersistence for InMemoryPersistence {
    async fn load(&self) -> Result<Option<TokenPair>, PersistenceError> {
        Ok(self.snapshot())
    }

    async fn store(&self, pair: &TokenPair) -> Result<(), PersistenceError> {
        self.check_writable()?;
        *self.pair.lock() = Some(pair.clone());
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<(), PersistenceError> {
        self.check_writable()?;
        *self.pair.lock() = None;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    signed_out: AtomicUsize,
    signed_in: AtomicUsize,
}

impl RecordingSink {
    pub fn signed_out(&self) -> usize {
        self.signed_out.load(Ordering::SeqCst)
    }

    pub fn signed_in(&self) -> usize {
        self.signed_in.load(Ordering::SeqCst)
    }
}

impl AuthStateSink for RecordingSink {
    fn notify_signed_out(&self) {
        self.signed_out.fetch_add(1, Ordering::SeqCst);
    }

    fn notify_signed_in(&self, _user: Option<&UserProfile>) {
        self.signed_in.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, NotificationLevel)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, NotificationLevel)> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, level: NotificationLevel) {
        self.messages.lock().push((message.to_string(), level));
    }
}

/// A client wired to scripted collaborators.
pub struct Harness {
    pub client: AuthenticatedClient,
    pub http: Arc<ScriptedHttpClient>,
    pub persistence: Arc<InMemoryPersistence>,
    pub sink: Arc<RecordingSink>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    /// Builds a client whose session was restored from `initial`.
    pub async fn new(http: ScriptedHttpClient, initial: Option<TokenPair>) -> Self {
        let http = Arc::new(http);
        let persistence = Arc::new(initial.map_or_else(InMemoryPersistence::default, InMemoryPersistence::seeded));
        let sink = Arc::new(RecordingSink::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let client = AuthenticatedClient::new(
            http.clone(),
            persistence.clone(),
            sink.clone(),
            notifier.clone(),
        );
        client.restore_session().await.unwrap();
        Self {
            client,
            http,
            persistence,
            sink,
            notifier,
        }
    }
}
