//! Outbound session notifications

use lexo_domain::{NotificationLevel, UserProfile};

/// The holder of session state (the UI's auth context).
pub trait AuthStateSink: Send + Sync {
    /// The session ended; switch to the signed-out state.
    ///
    /// Must be safe to call when no session exists.
    fn notify_signed_out(&self);

    /// A session was established or restored.
    fn notify_signed_in(&self, _user: Option<&UserProfile>) {}
}

/// Fire-and-forget user-facing messages.
pub trait Notifier: Send + Sync {
    /// Shows a message to the user.
    fn notify(&self, message: &str, level: NotificationLevel);
}
