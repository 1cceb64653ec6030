//! Token persistence port
//!
//! Defines the interface for the store that keeps the token pair across
//! process restarts.

use async_trait::async_trait;
use lexo_domain::TokenPair;

/// Errors that can occur while reading or writing persisted tokens.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Durable storage for the access/refresh token pair.
#[async_trait]
pub trait TokenPersistence: Send + Sync {
    /// Loads the stored pair. Returns `None` when nothing is stored.
    async fn load(&self) -> Result<Option<TokenPair>, PersistenceError>;

    /// Replaces the stored pair.
    ///
    /// # Errors
    /// Returns an error if the pair cannot be written.
    async fn store(&self, pair: &TokenPair) -> Result<(), PersistenceError>;

    /// Removes both tokens.
    ///
    /// # Errors
    /// Returns an error if the stored pair cannot be removed.
    async fn clear_tokens(&self) -> Result<(), PersistenceError>;

    /// Returns the stored access token, empty when none.
    async fn access_token(&self) -> Result<String, PersistenceError> {
        Ok(self.load().await?.map(|p| p.access_token).unwrap_or_default())
    }

    /// Returns the stored refresh token, empty when none.
    async fn refresh_token(&self) -> Result<String, PersistenceError> {
        Ok(self.load().await?.map(|p| p.refresh_token).unwrap_or_default())
    }

    /// Replaces only the access token.
    async fn set_access_token(&self, token: &str) -> Result<(), PersistenceError> {
        let mut pair = self.load().await?.unwrap_or_else(|| TokenPair::new("", ""));
        token.clone_into(&mut pair.access_token);
        self.store(&pair).await
    }

    /// Replaces only the refresh token.
    async fn set_refresh_token(&self, token: &str) -> Result<(), PersistenceError> {
        let mut pair = self.load().await?.unwrap_or_else(|| TokenPair::new("", ""));
        token.clone_into(&mut pair.refresh_token);
        self.store(&pair).await
    }
}
