//! User-facing notification levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a user-facing notification (a toast in a UI, a log line in a CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Neutral information.
    #[default]
    Info,
    /// An operation completed.
    Success,
    /// Something the user should act on.
    Warning,
    /// An operation failed.
    Error,
}

impl NotificationLevel {
    /// Returns the level as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
