//! Crawler coordinator - the page loop
//!
//! This module drives one scrape run:
//! - Walking listing pages in order until one comes back empty
//! - Applying the page cap or record limit
//! - Upserting each page's records concurrently
//! - Pausing a random interval between pages

use crate::config::{Config, CrawlerConfig};
use crate::crawler::page::PageScraper;
use crate::record::{CandidateRecord, WantedPerson};
use crate::storage::{run_blocking, SharedStorage, Storage, StorageError};
use crate::SyncError;
use futures::future::join_all;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

/// Page cap used when a record limit drives the run instead
pub const UNBOUNDED_PAGE_CAP: u32 = 1000;

/// Why a successful run stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    /// An empty page was hit or the page cap was used up
    #[default]
    PagesExhausted,

    /// The record limit was reached
    LimitReached,
}

/// Result of one scrape run
#[derive(Debug, Clone, Default)]
pub struct ScrapeRun {
    /// Persisted entities in document order
    pub records: Vec<WantedPerson>,
    pub outcome: RunOutcome,
    /// Pages requested, including the empty one that ended the run
    pub pages_fetched: u32,
    /// Records that failed to persist and were skipped
    pub persist_failures: usize,
}

/// Main crawl orchestration structure
pub struct Crawler {
    scraper: PageScraper,
    storage: SharedStorage,
    settings: CrawlerConfig,
}

impl Crawler {
    /// Creates a crawler writing into `storage`
    pub fn new(config: &Config, storage: SharedStorage) -> Result<Self, SyncError> {
        Ok(Self {
            scraper: PageScraper::new(config)?,
            storage,
            settings: config.crawler.clone(),
        })
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Runs the page loop
    ///
    /// With `record_limit` set, the page cap is replaced by
    /// [`UNBOUNDED_PAGE_CAP`] and the limit becomes the stopping condition.
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeRun)` - The listing or the limit was exhausted
    /// * `Err(SyncError::FatalScrape)` - Something outside per-page and
    ///   per-record handling failed; records persisted so far stay persisted
    pub async fn run(
        &self,
        page_cap: u32,
        record_limit: Option<usize>,
    ) -> Result<ScrapeRun, SyncError> {
        let effective_cap = if record_limit.is_some() {
            UNBOUNDED_PAGE_CAP
        } else {
            page_cap
        };

        tracing::info!(
            "Starting scrape job. Max pages: {}, Limit: {}",
            effective_cap,
            record_limit.map_or_else(|| "unlimited".to_string(), |l| l.to_string())
        );

        let mut run = ScrapeRun::default();

        if record_limit == Some(0) {
            run.outcome = RunOutcome::LimitReached;
            return Ok(run);
        }

        for page in 1..=effective_cap {
            tracing::info!("Scraping page {}...", page);

            let candidates = self.scraper.scrape_page(page).await;
            run.pages_fetched = page;

            if candidates.is_empty() {
                tracing::warn!("No records found on page {}. Stopping.", page);
                break;
            }

            let batch = match record_limit {
                Some(limit) => {
                    let remaining = limit.saturating_sub(run.records.len());
                    candidates.into_iter().take(remaining).collect()
                }
                None => candidates,
            };

            let (persisted, failures) = self.persist_batch(batch).await.map_err(|e| {
                tracing::error!("Fatal error scraping page {}: {}", page, e);
                SyncError::FatalScrape {
                    pages_completed: page - 1,
                    message: e.to_string(),
                }
            })?;

            run.records.extend(persisted);
            run.persist_failures += failures;

            if record_limit.is_some_and(|limit| run.records.len() >= limit) {
                tracing::info!("Reached limit of {} records. Stopping.", run.records.len());
                run.outcome = RunOutcome::LimitReached;
                return Ok(run);
            }

            if page < effective_cap {
                tokio::time::sleep(politeness_delay(&self.settings)).await;
            }
        }

        tracing::info!(
            "Scraping completed. Total: {} record(s) from {} page(s)",
            run.records.len(),
            run.pages_fetched
        );
        Ok(run)
    }

    /// Upserts one page's records concurrently and waits for all of them
    ///
    /// Individual failures are logged and counted. A crashed task or a
    /// poisoned store lock is returned as an error.
    async fn persist_batch(
        &self,
        batch: Vec<CandidateRecord>,
    ) -> Result<(Vec<WantedPerson>, usize), SyncError> {
        let saves = batch.into_iter().map(|candidate| async move {
            let name = candidate.name.clone();
            let result = run_blocking(&self.storage, move |s| s.upsert(&candidate)).await;
            (name, result)
        });

        let mut persisted = Vec::new();
        let mut failures = 0;

        for (name, result) in join_all(saves).await {
            match result? {
                Ok(person) => persisted.push(person),
                Err(StorageError::LockPoisoned) => {
                    return Err(StorageError::LockPoisoned.into());
                }
                Err(e) => {
                    tracing::error!("Failed to save {}: {}", name, e);
                    failures += 1;
                }
            }
        }

        Ok((persisted, failures))
    }
}

/// Picks a uniform random pause in `[politeness_min_ms, politeness_max_ms)`
fn politeness_delay(settings: &CrawlerConfig) -> Duration {
    let (min, max) = (settings.politeness_min_ms, settings.politeness_max_ms);
    let millis = if max > min {
        rand::thread_rng().gen_range(min..max)
    } else {
        min
    };
    Duration::from_millis(millis)
}
