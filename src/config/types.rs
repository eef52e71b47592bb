use serde::Deserialize;

/// Main configuration structure for Wanted-Sync
///
/// Every section has defaults, so an empty file (or no file at all) yields
/// a configuration pointed at the live registry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
}

/// Where the registry lives and how requests to it are dressed
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Scheme and host of the registry, also sent as the referer
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the first listing page
    #[serde(rename = "first-page-path")]
    pub first_page_path: String,

    /// Path of subsequent listing pages; the page number goes in `?page=`
    #[serde(rename = "page-path")]
    pub page_path: String,

    /// Request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Skip certificate validation for this host only
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://truyna.bocongan.gov.vn".to_string(),
            first_page_path: "/Trang-chủ".to_string(),
            page_path: "/Trang-chủ/ctl/chitiet/mid/1091".to_string(),
            timeout_secs: 30,
            // The registry's certificate chain is incomplete
            accept_invalid_certs: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
        }
    }
}

/// Crawl loop and row parsing behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Lower bound of the random pause between pages (milliseconds)
    #[serde(rename = "politeness-min-ms")]
    pub politeness_min_ms: u64,

    /// Upper bound (exclusive) of the random pause between pages (milliseconds)
    #[serde(rename = "politeness-max-ms")]
    pub politeness_max_ms: u64,

    /// Minimum number of `<td>` cells a row needs before it is parsed
    #[serde(rename = "min-cells")]
    pub min_cells: usize,

    /// Upper-case names before storing them
    #[serde(rename = "uppercase-names")]
    pub uppercase_names: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            politeness_min_ms: 1000,
            politeness_max_ms: 2000,
            min_cells: 7,
            uppercase_names: true,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./wanted.db".to_string(),
        }
    }
}

/// Scheduled job configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pages scraped by the daily job
    #[serde(rename = "daily-pages")]
    pub daily_pages: u32,

    /// Pages scraped by the weekly sweep
    #[serde(rename = "weekly-pages")]
    pub weekly_pages: u32,

    /// Six-field cron expression (sec min hour dom month dow)
    #[serde(rename = "daily-cron")]
    pub daily_cron: String,

    #[serde(rename = "weekly-cron")]
    pub weekly_cron: String,

    /// Offset of the schedule's wall clock from UTC, in hours
    #[serde(rename = "utc-offset-hours")]
    pub utc_offset_hours: i32,

    /// File where a running daemon publishes its status
    #[serde(rename = "status-path")]
    pub status_path: String,
}

/// Offset of the registry's home zone, Asia/Ho_Chi_Minh (no DST)
pub const REGISTRY_UTC_OFFSET_HOURS: i32 = 7;

impl ScheduleConfig {
    /// Names the zone the cron expressions run in, from `utc_offset_hours`
    pub fn timezone_label(&self) -> String {
        match self.utc_offset_hours {
            REGISTRY_UTC_OFFSET_HOURS => "Asia/Ho_Chi_Minh".to_string(),
            0 => "UTC".to_string(),
            hours => format!("UTC{:+03}:00", hours),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_pages: 10,
            weekly_pages: 50,
            daily_cron: "0 0 2 * * *".to_string(),
            weekly_cron: "0 0 3 * * Sun".to_string(),
            utc_offset_hours: REGISTRY_UTC_OFFSET_HOURS,
            status_path: "./wanted-sync.status.json".to_string(),
        }
    }
}
