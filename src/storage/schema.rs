//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Wanted-Sync database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per logical wanted person
CREATE TABLE IF NOT EXISTS wanted_persons (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(name) > 0),
    birth_year INTEGER,
    address TEXT,
    parents TEXT,
    crime TEXT NOT NULL CHECK (length(crime) > 0),
    decision_number TEXT,
    issuing_unit TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wanted_decision ON wanted_persons(decision_number);
CREATE INDEX IF NOT EXISTS idx_wanted_name_birth ON wanted_persons(name, birth_year);
CREATE INDEX IF NOT EXISTS idx_wanted_created ON wanted_persons(created_at);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
