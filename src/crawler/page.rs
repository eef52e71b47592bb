//! Single-page scraping: fetch one listing page and parse its rows

use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{parse_listing, ParseOptions};
use crate::record::CandidateRecord;
use crate::SyncError;

/// Fetches and parses listing pages
pub struct PageScraper {
    fetcher: PageFetcher,
    options: ParseOptions,
}

impl PageScraper {
    pub fn new(config: &Config) -> Result<Self, SyncError> {
        Ok(Self {
            fetcher: PageFetcher::new(&config.source)?,
            options: ParseOptions::from(&config.crawler),
        })
    }

    /// Scrapes one listing page
    ///
    /// A failed or timed-out fetch is logged and reported as an empty page,
    /// so the caller sees it exactly like the end of the listing.
    pub async fn scrape_page(&self, page: u32) -> Vec<CandidateRecord> {
        let html = match self.fetcher.fetch(page).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Error scraping page {}: {}", page, e);
                return Vec::new();
            }
        };

        let records = parse_listing(&html, &self.options);
        tracing::debug!("Page {} yielded {} record(s)", page, records.len());
        records
    }
}
