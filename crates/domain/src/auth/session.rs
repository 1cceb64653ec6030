//! Session-level outcomes and refresh phases.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::token::UserProfile;

/// What a successful sign-in means for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SignInOutcome {
    /// Tokens were issued and stored; the user is signed in.
    SessionEstablished {
        /// The signed-in account, when the server returned it
        user: Option<UserProfile>,
    },
    /// The account has no password yet. No tokens were stored; the caller
    /// should route the user to password creation.
    RequiresPasswordSetup {
        /// The account, when the server returned it
        user: Option<UserProfile>,
    },
}

impl SignInOutcome {
    /// Returns true when a session now exists.
    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self, Self::SessionEstablished { .. })
    }

    /// Returns the account attached to the outcome.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::SessionEstablished { user } | Self::RequiresPasswordSetup { user } => {
                user.as_ref()
            }
        }
    }
}

/// Observable phase of the token refresh state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    /// No refresh running.
    #[default]
    Idle,
    /// One refresh call is in flight; new 401s attach to it.
    InFlight,
    /// The last refresh failed; 401s end the session until the next sign-in.
    Failed,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::InFlight => "in flight",
            Self::Failed => "failed",
        })
    }
}
