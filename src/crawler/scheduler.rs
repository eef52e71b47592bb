//! Schedule coordinator for the recurring jobs
//!
//! This module handles:
//! - Registering the daily and weekly cron jobs in the source's timezone
//! - A single-flight guard shared by both jobs
//! - Running a crawl followed by the import pass
//! - Publishing whether a job is running to a status file other processes read

use crate::config::ScheduleConfig;
use crate::crawler::coordinator::Crawler;
use crate::crawler::crawl_and_import;
use crate::crawler::import::ImportSummary;
use crate::SyncError;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_cron_scheduler::{Job, JobScheduler};

/// The two recurring job families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Daily,
    Weekly,
}

impl JobKind {
    pub fn name(self) -> &'static str {
        match self {
            JobKind::Daily => "daily-wanted-persons",
            JobKind::Weekly => "weekly-full-sweep",
        }
    }
}

/// What a fired job ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Another job held the guard
    Skipped,
    Completed(ImportSummary),
    Failed(String),
}

/// Status surface of the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub daily_schedule: String,
    pub weekly_schedule: String,
}

impl SchedulerStatus {
    /// Status of a scheduler with no job in flight
    pub fn idle(config: &ScheduleConfig) -> Self {
        let zone = config.timezone_label();
        Self {
            is_running: false,
            daily_schedule: format!("{} ({})", config.daily_cron, zone),
            weekly_schedule: format!("{} ({})", config.weekly_cron, zone),
        }
    }
}

/// Replaces the status file in one rename
pub fn write_status_file(path: &Path, status: &SchedulerStatus) -> Result<(), SyncError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(status)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads the status a daemon published, `None` when no daemon has written one
pub fn read_status_file(path: &Path) -> Result<Option<SchedulerStatus>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Removes the status file; a missing file is not an error
pub fn clear_status_file(path: &Path) -> Result<(), SyncError> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Proof that the caller holds the single-flight guard
///
/// Dropping it releases the guard.
pub struct JobGuard {
    _permit: OwnedSemaphorePermit,
}

/// Runs scheduled jobs one at a time
pub struct ScheduleCoordinator {
    crawler: Arc<Crawler>,
    config: ScheduleConfig,
    guard: Arc<Semaphore>,
    status_path: Option<PathBuf>,
}

impl ScheduleCoordinator {
    pub fn new(crawler: Arc<Crawler>, config: ScheduleConfig) -> Self {
        Self {
            crawler,
            config,
            guard: Arc::new(Semaphore::new(1)),
            status_path: None,
        }
    }

    /// Publishes every guard change to `path`
    pub fn with_status_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.status_path = Some(path.into());
        self
    }

    fn publish_status(&self) {
        if let Some(path) = &self.status_path {
            if let Err(e) = write_status_file(path, &self.status()) {
                tracing::warn!("Failed to write status to {}: {}", path.display(), e);
            }
        }
    }

    /// Takes the guard if nobody holds it
    pub fn try_begin(&self) -> Option<JobGuard> {
        Arc::clone(&self.guard)
            .try_acquire_owned()
            .ok()
            .map(|permit| JobGuard { _permit: permit })
    }

    pub fn is_running(&self) -> bool {
        self.guard.available_permits() == 0
    }

    pub fn pages_for(&self, kind: JobKind) -> u32 {
        match kind {
            JobKind::Daily => self.config.daily_pages,
            JobKind::Weekly => self.config.weekly_pages,
        }
    }

    fn cron_for(&self, kind: JobKind) -> &str {
        match kind {
            JobKind::Daily => &self.config.daily_cron,
            JobKind::Weekly => &self.config.weekly_cron,
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            is_running: self.is_running(),
            ..SchedulerStatus::idle(&self.config)
        }
    }

    /// Body of a fired job
    ///
    /// Skips with a warning when the guard is already held. Otherwise runs
    /// the crawl and the import pass; the guard is released on every path.
    pub async fn run_job(&self, kind: JobKind) -> JobOutcome {
        let Some(guard) = self.try_begin() else {
            tracing::warn!("Scraping job already running, skipping {}", kind.name());
            return JobOutcome::Skipped;
        };
        self.publish_status();

        let outcome = self.execute(kind).await;

        drop(guard);
        self.publish_status();
        outcome
    }

    async fn execute(&self, kind: JobKind) -> JobOutcome {
        let pages = self.pages_for(kind);
        tracing::info!("Starting {} job ({} pages)", kind.name(), pages);

        match crawl_and_import(&self.crawler, pages).await {
            Ok(summary) => {
                tracing::info!("{} job completed", kind.name());
                JobOutcome::Completed(summary)
            }
            Err(e) => {
                tracing::error!("{} job failed: {}", kind.name(), e);
                JobOutcome::Failed(e.to_string())
            }
        }
    }

    /// Registers both jobs and starts the cron scheduler
    ///
    /// The returned scheduler keeps running until shut down.
    pub async fn start(self: &Arc<Self>) -> Result<JobScheduler, SyncError> {
        let zone = self.config.timezone_label();
        let offset = FixedOffset::east_opt(self.config.utc_offset_hours * 3600).ok_or_else(|| {
            SyncError::Schedule(format!(
                "invalid UTC offset: {} hours",
                self.config.utc_offset_hours
            ))
        })?;

        let scheduler = JobScheduler::new().await.map_err(schedule_error)?;

        for kind in [JobKind::Daily, JobKind::Weekly] {
            let coordinator = Arc::clone(self);
            let job = Job::new_async_tz(self.cron_for(kind), offset, move |_uuid, _lock| {
                let coordinator = Arc::clone(&coordinator);
                Box::pin(async move {
                    coordinator.run_job(kind).await;
                })
            })
            .map_err(schedule_error)?;

            scheduler.add(job).await.map_err(schedule_error)?;
            tracing::info!(
                "Registered {} at '{}' ({})",
                kind.name(),
                self.cron_for(kind),
                zone
            );
        }

        scheduler.start().await.map_err(schedule_error)?;
        self.publish_status();
        Ok(scheduler)
    }
}

fn schedule_error(e: impl std::fmt::Display) -> SyncError {
    SyncError::Schedule(e.to_string())
}
