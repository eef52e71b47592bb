//! Wanted-Sync main entry point
//!
//! This is the command-line interface for the wanted-persons registry importer.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wanted_sync::config::{apply_env_overrides, load_config_with_hash, validate, Config};
use wanted_sync::crawler::{
    clear_status_file, crawl_and_import, read_status_file, trigger_scrape, Crawler,
    ScheduleCoordinator, SchedulerStatus, DEFAULT_TRIGGER_PAGES,
};
use wanted_sync::output::{print_import_summary, print_json, print_record_page};
use wanted_sync::storage::{open_storage, run_blocking, ListQuery, SharedStorage, Storage};
use tracing_subscriber::EnvFilter;

/// Wanted-Sync: a polite importer for a public wanted-persons registry
///
/// Wanted-Sync walks the registry's paginated listing, normalizes each row,
/// and merges the results into a local SQLite database, either on demand or
/// on a daily and weekly schedule.
#[derive(Parser, Debug)]
#[command(name = "wanted-sync")]
#[command(version = "1.0.0")]
#[command(about = "A polite importer for a public wanted-persons registry", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape once, import the results, and print the counts
    Run {
        /// Number of listing pages to scrape
        #[arg(value_name = "PAGES", default_value_t = DEFAULT_TRIGGER_PAGES)]
        pages: u32,
    },

    /// Scrape immediately and print the scraped records as JSON
    Trigger {
        /// Number of listing pages to scrape
        #[arg(long)]
        pages: Option<u32>,

        /// Stop after this many records (lifts the page cap)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run the daily and weekly jobs until interrupted
    Daemon,

    /// Print the running daemon's scheduler status as JSON
    Status,

    /// List stored records
    List {
        /// Match name or crime
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        crime: Option<String>,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Records per page
        #[arg(long, default_value_t = 9)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    match cli.command {
        Command::Run { pages } => handle_run(&config, pages).await,
        Command::Trigger { pages, limit } => handle_trigger(&config, pages, limit).await,
        Command::Daemon => handle_daemon(&config).await,
        Command::Status => handle_status(&config),
        Command::List {
            search,
            name,
            crime,
            page,
            limit,
        } => {
            let query = ListQuery {
                search,
                name,
                crime,
                page,
                limit,
            };
            handle_list(&config, query).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wanted_sync=info,warn"),
            1 => EnvFilter::new("wanted_sync=debug,info"),
            2 => EnvFilter::new("wanted_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, otherwise the built-in defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let mut config = Config::default();
            apply_env_overrides(&mut config)?;
            validate(&config)?;
            tracing::debug!("Using default configuration");
            Ok(config)
        }
    }
}

fn open_database(config: &Config) -> anyhow::Result<SharedStorage> {
    let path = Path::new(&config.storage.database_path);
    open_storage(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn build_crawler(config: &Config) -> anyhow::Result<Crawler> {
    let storage = open_database(config)?;
    Ok(Crawler::new(config, storage)?)
}

/// Handles `run`: one crawl-and-import pass
async fn handle_run(config: &Config, pages: u32) -> anyhow::Result<()> {
    tracing::info!("Starting one-shot scrape of {} pages", pages);
    let crawler = build_crawler(config)?;

    match crawl_and_import(&crawler, pages).await {
        Ok(summary) => {
            print_import_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles `trigger`: an immediate scrape reported as JSON
async fn handle_trigger(
    config: &Config,
    pages: Option<u32>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let crawler = build_crawler(config)?;
    let response = trigger_scrape(&crawler, pages, limit).await?;
    print_json(&response)?;
    Ok(())
}

/// Handles `daemon`: runs the scheduled jobs until Ctrl-C
async fn handle_daemon(config: &Config) -> anyhow::Result<()> {
    let status_path = PathBuf::from(&config.schedule.status_path);
    let crawler = Arc::new(build_crawler(config)?);
    let coordinator = Arc::new(
        ScheduleCoordinator::new(crawler, config.schedule.clone())
            .with_status_file(&status_path),
    );

    let mut scheduler = coordinator
        .start()
        .await
        .context("failed to start the job scheduler")?;

    let status = coordinator.status();
    tracing::info!(
        "Scheduler started. Daily: {}, Weekly: {}",
        status.daily_schedule,
        status.weekly_schedule
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    tracing::info!("Shutting down scheduler");
    scheduler
        .shutdown()
        .await
        .map_err(|e| anyhow::anyhow!("scheduler shutdown failed: {}", e))?;
    clear_status_file(&status_path)?;

    Ok(())
}

/// Handles `status`: the status a running daemon published
///
/// Without a daemon, reports the configured schedules as idle.
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.schedule.status_path);
    let status = read_status_file(path)
        .with_context(|| format!("failed to read status from {}", path.display()))?
        .unwrap_or_else(|| SchedulerStatus::idle(&config.schedule));
    print_json(&status)?;
    Ok(())
}

/// Handles `list`: a filtered page of stored records
async fn handle_list(config: &Config, query: ListQuery) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let page = run_blocking(&storage, move |s| s.search(&query)).await??;
    print_record_page(&page);
    Ok(())
}
