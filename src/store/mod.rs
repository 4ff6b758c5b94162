//! Entry Store - users and financial entries
//!
//! In-memory tables behind a `parking_lot::RwLock`, optionally mirrored to a
//! JSON-lines file that is rewritten atomically after every committed write.

mod entries;
mod persist;
mod stats;
mod users;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::types::{DateRange, Entry, EntryStats, User};
use crate::utils::AtomicError;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("failed to persist data: {0}")]
    Persist(#[from] AtomicError),
    #[error("failed to load data file {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Default, Clone)]
pub(crate) struct StoreData {
    pub(crate) users: Vec<User>,
    pub(crate) entries: Vec<Entry>,
}

/// Users and entries, shared across request handlers
pub struct Store {
    pub(crate) file_path: Option<PathBuf>,
    pub(crate) data: RwLock<StoreData>,
}

impl Store {
    /// Create an empty store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            file_path: None,
            data: RwLock::new(StoreData::default()),
        }
    }

    /// Open a store backed by a JSON-lines file, loading it if present
    pub fn open<P: AsRef<Path>>(file_path: P) -> StoreResult<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        let data = persist::load(&file_path)?;
        tracing::info!(
            path = %file_path.display(),
            users = data.users.len(),
            entries = data.entries.len(),
            "Loaded data file"
        );

        Ok(Self {
            file_path: Some(file_path),
            data: RwLock::new(data),
        })
    }

    /// Apply a change and make it durable; `data` is the write-locked table
    ///
    /// With a data file the change is applied to a copy, the copy is
    /// written, and only a successful write replaces `data`. A failed write
    /// leaves memory untouched.
    pub(crate) fn commit<T, F>(&self, data: &mut StoreData, apply: F) -> StoreResult<T>
    where
        F: FnOnce(&mut StoreData) -> T,
    {
        let Some(path) = &self.file_path else {
            return Ok(apply(data));
        };

        let mut candidate = data.clone();
        let outcome = apply(&mut candidate);
        persist::save(path, &candidate)?;
        *data = candidate;
        Ok(outcome)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Source of aggregate statistics for the real-time `get_stats` request
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn aggregate_stats(&self, user_id: &str, range: DateRange) -> StoreResult<EntryStats>;
}

#[async_trait]
impl StatsProvider for Store {
    async fn aggregate_stats(&self, user_id: &str, range: DateRange) -> StoreResult<EntryStats> {
        Ok(self.entry_stats(user_id, range))
    }
}
