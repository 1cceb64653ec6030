//! Auth state shared with the rest of the process.

use std::sync::atomic::{AtomicUsize, Ordering};

use lexo_application::ports::AuthStateSink;
use lexo_domain::UserProfile;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// Whether a user is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// No session.
    SignedOut,
    /// A session exists.
    SignedIn,
}

/// Holds the auth status and broadcasts its changes.
///
/// Subscribers get a `watch` receiver and see the latest status; repeated
/// sign-outs are harmless.
#[derive(Debug)]
pub struct SessionState {
    status: watch::Sender<AuthStatus>,
    user: Mutex<Option<UserProfile>>,
    sign_outs: AtomicUsize,
}

impl SessionState {
    /// Creates a signed-out state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: watch::Sender::new(AuthStatus::SignedOut),
            user: Mutex::new(None),
            sign_outs: AtomicUsize::new(0),
        }
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// Returns the signed-in account, when the server sent one.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.user.lock().clone()
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Number of sign-out notifications received.
    #[must_use]
    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStateSink for SessionState {
    fn notify_signed_out(&self) {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        *self.user.lock() = None;
        self.status.send_replace(AuthStatus::SignedOut);
        debug!("auth state: signed out");
    }

    fn notify_signed_in(&self, user: Option<&UserProfile>) {
        if let Some(user) = user {
            *self.user.lock() = Some(user.clone());
        }
        self.status.send_replace(AuthStatus::SignedIn);
        debug!("auth state: signed in");
    }
}
