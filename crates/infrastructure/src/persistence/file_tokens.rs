//! File-based token persistence.
//!
//! The pair is stored as one JSON document:
//! ```json
//! {
//!   "schema_version": 1,
//!   "access_token": "eyJhbGciOi...",
//!   "refresh_token": "eyJhbGciOi...",
//!   "saved_at": "2026-01-04T10:15:00Z"
//! }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexo_application::ports::{PersistenceError, TokenPersistence};
use lexo_domain::TokenPair;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    schema_version: u32,
    access_token: String,
    refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

/// Stores the token pair in a JSON file.
///
/// A missing file is an empty session. Writes go to a sibling temp file
/// that is renamed over the target, so a crash never leaves half a pair.
#[derive(Debug, Clone)]
pub struct FileTokenPersistence {
    path: PathBuf,
}

impl FileTokenPersistence {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TokenPersistence for FileTokenPersistence {
    async fn load(&self) -> Result<Option<TokenPair>, PersistenceError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: SessionFile = from_json_bytes(&content)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        if file.schema_version != SCHEMA_VERSION {
            return Err(PersistenceError::Serialization(format!(
                "unsupported schema version {}",
                file.schema_version
            )));
        }

        Ok(Some(TokenPair::new(file.access_token, file.refresh_token)))
    }

    async fn store(&self, pair: &TokenPair) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = SessionFile {
            schema_version: SCHEMA_VERSION,
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            saved_at: Some(Utc::now()),
        };
        let content = to_json_stable_bytes(&file)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        fs::write(&temp, &content).await?;
        fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), "tokens written");
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "tokens removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
