//! Administrative trigger: an immediate, unguarded scrape

use crate::crawler::coordinator::Crawler;
use crate::record::WantedPerson;
use crate::SyncError;
use serde::Serialize;

/// Pages scraped by a trigger that names none
pub const DEFAULT_TRIGGER_PAGES: u32 = 5;

/// JSON body reported for a manual trigger
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub success: bool,
    pub count: usize,
    pub records: Vec<WantedPerson>,
    pub message: String,
}

/// Runs the page loop right away
///
/// The scheduled jobs' single-flight guard is not consulted, so a trigger
/// may overlap a scheduled run.
pub async fn trigger_scrape(
    crawler: &Crawler,
    pages: Option<u32>,
    limit: Option<usize>,
) -> Result<TriggerResponse, SyncError> {
    let pages = pages.unwrap_or(DEFAULT_TRIGGER_PAGES);
    tracing::info!("Manual scrape triggered");

    let run = crawler.run(pages, limit).await?;
    let count = run.records.len();

    Ok(TriggerResponse {
        success: true,
        count,
        records: run.records,
        message: format!("Successfully scraped {} records", count),
    })
}
