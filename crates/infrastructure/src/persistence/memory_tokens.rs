//! In-memory token persistence.

use async_trait::async_trait;
use lexo_application::ports::{PersistenceError, TokenPersistence};
use lexo_domain::TokenPair;
use parking_lot::Mutex;

/// Keeps the pair for the life of the process only.
#[derive(Debug, Default)]
pub struct MemoryTokenPersistence {
    pair: Mutex<Option<TokenPair>>,
}

impl MemoryTokenPersistence {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `pair`.
    #[must_use]
    pub fn with_tokens(pair: TokenPair) -> Self {
        Self {
            pair: Mutex::new(Some(pair)),
        }
    }
}

#[async_trait]
impl TokenPersistence for MemoryTokenPersistence {
    async fn load(&self) -> Result<Option<TokenPair>, PersistenceError> {
        Ok(self.pair.lock().clone())
    }

    async fn store(&self, pair: &TokenPair) -> Result<(), PersistenceError> {
        *self.pair.lock() = Some(pair.clone());
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<(), PersistenceError> {
        *self.pair.lock() = None;
        Ok(())
    }
}
