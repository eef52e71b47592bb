//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::record::{CandidateRecord, WantedPerson};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ListQuery, RecordPage};
use crate::SyncError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT id, name, birth_year, address, parents, crime, \
     decision_number, issuing_unit, created_at FROM wanted_persons";

/// `?1` matches name or crime, `?2` name, `?3` crime; NULL disables a filter
const SEARCH_FILTER: &str = "WHERE (?1 IS NULL OR instr(unicode_lower(name), ?1) > 0 \
     OR instr(unicode_lower(crime), ?1) > 0) \
     AND (?2 IS NULL OR instr(unicode_lower(name), ?2) > 0) \
     AND (?3 IS NULL OR instr(unicode_lower(crime), ?3) > 0)";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SyncError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SyncError> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(StorageError::from)?;

        Self::from_connection(conn)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, SyncError> {
        register_functions(&conn).map_err(StorageError::from)?;
        initialize_schema(&conn).map_err(StorageError::from)?;
        Ok(Self { conn })
    }

    fn query_one(
        &self,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Option<WantedPerson>> {
        let sql = format!("{} {} ORDER BY created_at ASC, rowid ASC LIMIT 1", SELECT_COLUMNS, clause);
        let person = self
            .conn
            .query_row(&sql, params, person_from_row)
            .optional()?;
        Ok(person)
    }
}

/// Registers `unicode_lower`, a lowercase that folds non-ASCII letters
///
/// SQLite's built-in `lower()` and `LIKE` only fold ASCII.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )
}

/// Maps a `SELECT_COLUMNS` row into a `WantedPerson`
fn person_from_row(row: &Row<'_>) -> rusqlite::Result<WantedPerson> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    let created_at: String = row.get(8)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(WantedPerson {
        id,
        name: row.get(1)?,
        birth_year: row.get(2)?,
        address: row.get(3)?,
        parents: row.get(4)?,
        crime: row.get(5)?,
        decision_number: row.get(6)?,
        issuing_unit: row.get(7)?,
        created_at,
    })
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Storage for SqliteStorage {
    // ===== Lookups =====

    fn find_by_decision_number(
        &self,
        decision_number: &str,
    ) -> StorageResult<Option<WantedPerson>> {
        self.query_one("WHERE decision_number = ?1", params![decision_number])
    }

    fn find_by_name_and_birth_year(
        &self,
        name: &str,
        birth_year: Option<i32>,
    ) -> StorageResult<Option<WantedPerson>> {
        // `IS` treats NULL = NULL as a match
        self.query_one(
            "WHERE name = ?1 AND birth_year IS ?2",
            params![name, birth_year],
        )
    }

    fn get(&self, id: &Uuid) -> StorageResult<Option<WantedPerson>> {
        self.query_one("WHERE id = ?1", params![id.to_string()])
    }

    fn find_all(&self) -> StorageResult<Vec<WantedPerson>> {
        let sql = format!("{} ORDER BY created_at DESC, rowid DESC", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        let persons = stmt
            .query_map([], person_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(persons)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM wanted_persons", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Writes =====

    fn insert(&mut self, candidate: &CandidateRecord) -> StorageResult<WantedPerson> {
        candidate.validate()?;

        let person = WantedPerson::from_candidate(candidate);
        self.conn.execute(
            "INSERT INTO wanted_persons (id, name, birth_year, address, parents, crime,
             decision_number, issuing_unit, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                person.id.to_string(),
                person.name,
                person.birth_year,
                person.address,
                person.parents,
                person.crime,
                person.decision_number,
                person.issuing_unit,
                timestamp(&person.created_at),
            ],
        )?;

        Ok(person)
    }

    fn update(&mut self, person: &WantedPerson) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE wanted_persons SET name = ?1, birth_year = ?2, address = ?3, parents = ?4,
             crime = ?5, decision_number = ?6, issuing_unit = ?7 WHERE id = ?8",
            params![
                person.name,
                person.birth_year,
                person.address,
                person.parents,
                person.crime,
                person.decision_number,
                person.issuing_unit,
                person.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::NotFound(person.id));
        }
        Ok(())
    }

    fn search(&self, query: &ListQuery) -> StorageResult<RecordPage> {
        let needle = |s: &Option<String>| s.as_ref().map(|v| v.to_lowercase());
        let search = needle(&query.search);
        let name = needle(&query.name);
        let crime = needle(&query.crime);

        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let offset = (page - 1).saturating_mul(limit);

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM wanted_persons {}", SEARCH_FILTER),
            params![search, name, crime],
            |row| row.get(0),
        )?;

        let sql = format!(
            "{} {} ORDER BY created_at DESC, rowid DESC LIMIT ?4 OFFSET ?5",
            SELECT_COLUMNS, SEARCH_FILTER
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let data = stmt
            .query_map(
                params![
                    search,
                    name,
                    crime,
                    i64::try_from(limit).unwrap_or(i64::MAX),
                    i64::try_from(offset).unwrap_or(i64::MAX),
                ],
                person_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let total = total as usize;
        Ok(RecordPage {
            data,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }
}
