//! Storage module for persisting wanted persons
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Identity matching and merge-on-upsert
//! - Listing and filtering of stored records
//! - Sharing one connection between concurrent upserts

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::record::WantedPerson;
use crate::SyncError;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::JoinError;

/// Storage handle shared between the crawler, the scheduler and callers
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Opens the database at `path` and wraps it for sharing
pub fn open_storage(path: &Path) -> Result<SharedStorage, SyncError> {
    Ok(Arc::new(Mutex::new(SqliteStorage::new(path)?)))
}

/// Opens a throwaway in-memory database
pub fn open_in_memory() -> Result<SharedStorage, SyncError> {
    Ok(Arc::new(Mutex::new(SqliteStorage::new_in_memory()?)))
}

/// Runs a storage operation on the blocking pool
///
/// The outer error means the task itself died; the inner one is the
/// storage operation's own failure.
pub async fn run_blocking<T, F>(
    storage: &SharedStorage,
    op: F,
) -> Result<StorageResult<T>, JoinError>
where
    F: FnOnce(&mut SqliteStorage) -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || {
        let mut guard = storage.lock().map_err(|_| StorageError::LockPoisoned)?;
        op(&mut guard)
    })
    .await
}

/// Filters for listing stored records
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Matches name or crime
    pub search: Option<String>,
    pub name: Option<String>,
    pub crime: Option<String>,
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            name: None,
            crime: None,
            page: 1,
            limit: 9,
        }
    }
}

/// One page of listed records
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub data: Vec<WantedPerson>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}
