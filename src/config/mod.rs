//! Configuration module for Wanted-Sync
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use wanted_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("wanted-sync.toml")).unwrap();
//! println!("Daily job scrapes {} pages", config.schedule.daily_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ScheduleConfig, SourceConfig, StorageConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash,
    DAILY_PAGES_ENV, WEEKLY_PAGES_ENV,
};
pub use validation::validate;
