use crate::config::types::{Config, CrawlerConfig, ScheduleConfig, SourceConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_schedule_config(&config.schedule)?;
    Ok(())
}

/// Validates the registry location and request settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    for (key, path) in [
        ("first-page-path", &config.first_page_path),
        ("page-path", &config.page_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "{} must start with '/', got '{}'",
                key, path
            )));
        }
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl loop settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.politeness_min_ms > config.politeness_max_ms {
        return Err(ConfigError::Validation(format!(
            "politeness-min-ms ({}) must not exceed politeness-max-ms ({})",
            config.politeness_min_ms, config.politeness_max_ms
        )));
    }

    // Crime lives in cell 5, the decision number in cell 6
    if !(7..=8).contains(&config.min_cells) {
        return Err(ConfigError::Validation(format!(
            "min-cells must be 7 or 8, got {}",
            config.min_cells
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates scheduled job settings
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if config.daily_pages == 0 || config.weekly_pages == 0 {
        return Err(ConfigError::Validation(format!(
            "daily-pages and weekly-pages must be >= 1, got {} and {}",
            config.daily_pages, config.weekly_pages
        )));
    }

    for (key, expr) in [
        ("daily-cron", &config.daily_cron),
        ("weekly-cron", &config.weekly_cron),
    ] {
        let fields = expr.split_whitespace().count();
        if !(6..=7).contains(&fields) {
            return Err(ConfigError::Validation(format!(
                "{} must have 6 or 7 fields (sec min hour dom month dow [year]), got '{}'",
                key, expr
            )));
        }
    }

    if !(-12..=14).contains(&config.utc_offset_hours) {
        return Err(ConfigError::Validation(format!(
            "utc-offset-hours must be between -12 and 14, got {}",
            config.utc_offset_hours
        )));
    }

    if config.status_path.is_empty() {
        return Err(ConfigError::Validation(
            "status-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
