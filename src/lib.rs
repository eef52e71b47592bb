//! Wanted-Sync: a polite importer for a public wanted-persons registry
//!
//! This crate crawls the paginated listing of a third-party registry,
//! normalizes each table row into a candidate record, and deduplicates the
//! candidates into a SQLite store, either on demand or on a fixed schedule.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod storage;

use thiserror::Error;

/// Main error type for Wanted-Sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Row parse error: {0}")]
    RowParse(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Scrape aborted after {pages_completed} page(s): {message}")]
    FatalScrape {
        pages_completed: u32,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scheduler error: {0}")]
    Schedule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid environment override {name}={value}")]
    InvalidEnv { name: String, value: String },
}

/// Result type alias for Wanted-Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, PageScraper, ScheduleCoordinator};
pub use record::{CandidateRecord, WantedPerson};
pub use storage::{SqliteStorage, Storage};
