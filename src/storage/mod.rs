//! Record store.
//!
//! Decks, duels and events are partitioned by owner id. The `RecordStore`
//! trait is what the rest of the crate talks to; `JsonlStore` keeps one
//! JSONL file per entity type under `<data_dir>/users/<owner>/`.

mod jsonl;
mod store;

pub use jsonl::*;
pub use store::*;

use std::path::PathBuf;
use thiserror::Error;

use crate::models::OwnerId;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid owner id: {0:?}")]
    InvalidOwner(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        StorageError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Root of all per-owner partitions.
    pub fn users_dir(&self) -> PathBuf {
        self.data_dir.join("users")
    }

    /// Partition directory for one owner.
    ///
    /// The owner id becomes a path component, so anything that could escape
    /// `users_dir` is rejected.
    pub fn owner_dir(&self, owner: &OwnerId) -> Result<PathBuf, StorageError> {
        let id = owner.as_str();
        let valid = !id.trim().is_empty()
            && !id.starts_with('.')
            && id.len() <= 128
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
        if !valid {
            return Err(StorageError::InvalidOwner(id.to_string()));
        }
        Ok(self.users_dir().join(id))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
