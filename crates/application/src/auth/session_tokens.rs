//! In-memory token pair mirrored into durable storage.

use std::sync::Arc;

use lexo_domain::TokenPair;
use tokio::sync::RwLock;
use tracing::warn;

use crate::ports::{PersistenceError, TokenPersistence};

/// The current token pair.
///
/// Reads are served from memory. Every write goes to memory and to the
/// persistence port while the write lock is held, so both copies change
/// in the same order. Persistence failures are logged and never fail the
/// request that caused the write.
pub struct SessionTokens {
    current: RwLock<Option<TokenPair>>,
    persistence: Arc<dyn TokenPersistence>,
}

impl SessionTokens {
    /// Creates an empty session backed by the given persistence.
    #[must_use]
    pub fn new(persistence: Arc<dyn TokenPersistence>) -> Self {
        Self {
            current: RwLock::new(None),
            persistence,
        }
    }

    /// Loads the persisted pair into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted pair cannot be read.
    pub async fn restore(&self) -> Result<Option<TokenPair>, PersistenceError> {
        let mut current = self.current.write().await;
        let loaded = self.persistence.load().await?.filter(|pair| !pair.is_empty());
        *current = loaded.clone();
        Ok(loaded)
    }

    /// Returns the current pair.
    pub async fn get(&self) -> Option<TokenPair> {
        self.current.read().await.clone()
    }

    /// Returns the access token, or `None` when it is missing or empty.
    pub async fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|pair| !pair.access_token.is_empty())
            .map(|pair| pair.access_token.clone())
    }

    /// Returns the refresh token, or `None` when it is missing or empty.
    pub async fn refresh_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|pair| pair.can_refresh())
            .map(|pair| pair.refresh_token.clone())
    }

    /// Replaces the pair if `commit` returns true.
    ///
    /// `commit` runs under the write lock, so whatever it checks or updates
    /// is ordered with every other write. Returns whether the pair was
    /// written.
    pub async fn store_if(&self, pair: TokenPair, commit: impl FnOnce() -> bool) -> bool {
        let mut current = self.current.write().await;
        if !commit() {
            return false;
        }
        if let Err(error) = self.persistence.store(&pair).await {
            warn!(%error, "failed to persist tokens");
        }
        *current = Some(pair);
        true
    }

    /// Drops the pair from memory and storage.
    pub async fn clear(&self) {
        self.clear_if(|| true).await;
    }

    /// Drops the pair if `commit` returns true; see [`Self::store_if`].
    pub async fn clear_if(&self, commit: impl FnOnce() -> bool) -> bool {
        let mut current = self.current.write().await;
        if !commit() {
            return false;
        }
        if let Err(error) = self.persistence.clear_tokens().await {
            warn!(%error, "failed to clear persisted tokens");
        }
        *current = None;
        true
    }

    /// Get token status for display.
    pub async fn status(&self) -> TokenStatus {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|pair| !pair.is_empty())
            .map_or(TokenStatus::SignedOut, |pair| TokenStatus::Active {
                can_refresh: pair.can_refresh(),
            })
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens").finish_non_exhaustive()
    }
}

/// Status of the session tokens for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No access token is held.
    SignedOut,
    /// An access token is held.
    Active {
        /// Whether a refresh token is held as well.
        can_refresh: bool,
    },
}

impl TokenStatus {
    /// Returns true if requests will carry a bearer token.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub const fn display_message(&self) -> &'static str {
        match self {
            Self::SignedOut => "Not signed in",
            Self::Active { can_refresh: true } => "Signed in",
            Self::Active { can_refresh: false } => "Signed in (no refresh token)",
        }
    }
}
