//! Coarse duplicate pass over scraped records
//!
//! Runs after the page loop for scheduled jobs and the one-shot command.
//! A record is created only when no stored record has the same name and
//! crime.

use crate::record::{CandidateRecord, WantedPerson};
use crate::storage::{run_blocking, SharedStorage, Storage};
use crate::SyncError;
use serde::Serialize;

/// Counts reported after an import pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub scraped: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub errors: usize,
}

enum ImportStep {
    Imported,
    Duplicate,
}

/// Imports scraped records that do not match an existing `(name, crime)` pair
///
/// The stored set is reloaded for every record. Storage failures are
/// counted and logged; only a crashed task aborts the pass.
pub async fn import_scraped(
    storage: &SharedStorage,
    records: &[WantedPerson],
) -> Result<ImportSummary, SyncError> {
    let mut summary = ImportSummary {
        scraped: records.len(),
        ..ImportSummary::default()
    };

    for record in records {
        let candidate = CandidateRecord::from(record);
        let name = candidate.name.clone();

        let step = run_blocking(storage, move |s| {
            let existing = s.find_all()?;
            if existing
                .iter()
                .any(|p| p.same_name_and_crime(&candidate.name, &candidate.crime))
            {
                return Ok(ImportStep::Duplicate);
            }
            s.insert(&candidate)?;
            Ok(ImportStep::Imported)
        })
        .await?;

        match step {
            Ok(ImportStep::Imported) => summary.imported += 1,
            Ok(ImportStep::Duplicate) => {
                tracing::debug!("Duplicate skipped: {}", name);
                summary.duplicates += 1;
            }
            Err(e) => {
                tracing::error!("Error importing {}: {}", name, e);
                summary.errors += 1;
            }
        }
    }

    tracing::info!(
        "Import finished: {} scraped, {} imported, {} duplicate(s), {} error(s)",
        summary.scraped,
        summary.imported,
        summary.duplicates,
        summary.errors
    );

    Ok(summary)
}
