//! Crawler module for the registry listing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of listing pages
//! - Row parsing into candidate records
//! - The page loop with limits and politeness delays
//! - The import pass and the scheduled jobs

mod coordinator;
mod fetcher;
mod import;
mod page;
mod parser;
mod scheduler;
mod trigger;

pub use coordinator::{Crawler, RunOutcome, ScrapeRun, UNBOUNDED_PAGE_CAP};
pub use fetcher::{build_http_client, PageFetcher};
pub use import::{import_scraped, ImportSummary};
pub use page::PageScraper;
pub use parser::{
    extract_birth_year, extract_rows, normalize_text, parse_listing, parse_row, ParseOptions,
    RowCell,
};
pub use scheduler::{
    clear_status_file, read_status_file, write_status_file, JobGuard, JobKind, JobOutcome,
    ScheduleCoordinator, SchedulerStatus,
};
pub use trigger::{trigger_scrape, TriggerResponse, DEFAULT_TRIGGER_PAGES};

use crate::SyncError;

/// Runs one crawl followed by the import pass
///
/// This is the body shared by the scheduled jobs and the one-shot command.
///
/// # Arguments
///
/// * `crawler` - The crawler to run
/// * `pages` - Page cap for the crawl
///
/// # Returns
///
/// * `Ok(ImportSummary)` - Counts from the import pass
/// * `Err(SyncError)` - The crawl aborted
pub async fn crawl_and_import(crawler: &Crawler, pages: u32) -> Result<ImportSummary, SyncError> {
    let run = crawler.run(pages, None).await?;
    tracing::info!("Scraped {} records", run.records.len());
    import_scraped(crawler.storage(), &run.records).await
}
