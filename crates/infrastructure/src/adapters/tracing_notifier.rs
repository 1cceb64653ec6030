//! Notifier that writes user messages to the log.

use lexo_application::ports::Notifier;
use lexo_domain::NotificationLevel;
use tracing::{error, info, warn};

/// Forwards notifications to `tracing`, at the level matching their
/// severity. Used by the CLI, where the log is the user's console.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NotificationLevel) {
        match level {
            NotificationLevel::Info | NotificationLevel::Success => {
                info!(target: "lexo::notify", %level, "{message}");
            }
            NotificationLevel::Warning => warn!(target: "lexo::notify", "{message}"),
            NotificationLevel::Error => error!(target: "lexo::notify", "{message}"),
        }
    }
}
