//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types. The dedup/upsert rules live here as default
//! methods so every backend resolves identities the same way.

use crate::record::{CandidateRecord, WantedPerson};
use crate::storage::{ListQuery, RecordPage};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Lookups =====

    /// Finds the entity carrying exactly this decision number
    fn find_by_decision_number(&self, decision_number: &str)
        -> StorageResult<Option<WantedPerson>>;

    /// Finds the entity with exactly this name and birth year
    ///
    /// An unset birth year only matches an unset birth year.
    fn find_by_name_and_birth_year(
        &self,
        name: &str,
        birth_year: Option<i32>,
    ) -> StorageResult<Option<WantedPerson>>;

    /// Gets an entity by id
    fn get(&self, id: &Uuid) -> StorageResult<Option<WantedPerson>>;

    /// Loads the complete record set, newest first
    fn find_all(&self) -> StorageResult<Vec<WantedPerson>>;

    /// Counts stored entities
    fn count(&self) -> StorageResult<u64>;

    // ===== Writes =====

    /// Creates a new entity from a candidate without any matching
    fn insert(&mut self, candidate: &CandidateRecord) -> StorageResult<WantedPerson>;

    /// Persists every field of an existing entity
    fn update(&mut self, person: &WantedPerson) -> StorageResult<()>;

    /// Resolves a candidate to an existing entity or creates a new one
    ///
    /// # Matching
    ///
    /// 1. If the candidate has a decision number, look for that exact number.
    /// 2. Otherwise, or on a miss, look for an exactly equal `(name, birth_year)`.
    /// 3. On a match, overwrite the fields present in the candidate and save.
    /// 4. With no match, insert a new entity.
    fn upsert(&mut self, candidate: &CandidateRecord) -> StorageResult<WantedPerson> {
        candidate.validate()?;

        let mut existing = match candidate.decision_number.as_deref() {
            Some(number) => self.find_by_decision_number(number)?,
            None => None,
        };

        if existing.is_none() {
            existing = self.find_by_name_and_birth_year(&candidate.name, candidate.birth_year)?;
        }

        match existing {
            Some(mut person) => {
                person.merge(candidate);
                self.update(&person)?;
                Ok(person)
            }
            None => self.insert(candidate),
        }
    }

    /// Filters and paginates the record set
    ///
    /// Filters are case-insensitive substring matches; `search` matches
    /// either name or crime. Results are newest first and pages are 1-based.
    fn search(&self, query: &ListQuery) -> StorageResult<RecordPage>;
}
