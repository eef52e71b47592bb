//! HTTP fetcher for registry listing pages
//!
//! This module handles all outbound requests to the registry, including:
//! - Building the one HTTP client allowed to talk to the legacy host
//! - Browser-like request headers
//! - Page URL construction and percent-encoding
//! - Error classification (timeout vs. transport vs. status)

use crate::config::SourceConfig;
use crate::{ConfigError, SyncError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Builds the HTTP client for the registry host
///
/// Certificate validation is switched off only when
/// `config.accept_invalid_certs` is set, and only on the client returned
/// here; nothing else in the process shares it.
pub fn build_http_client(config: &SourceConfig) -> Result<Client, SyncError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, header_value("accept-language", &config.accept_language)?);
    headers.insert(REFERER, header_value("base-url", &config.base_url)?);

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn header_value(key: &str, value: &str) -> Result<HeaderValue, SyncError> {
    HeaderValue::from_str(value).map_err(|_| {
        SyncError::Config(ConfigError::Validation(format!(
            "{} is not a valid header value: '{}'",
            key, value
        )))
    })
}

/// Fetches listing pages from the registry
pub struct PageFetcher {
    client: Client,
    base_url: Url,
    first_page_path: String,
    page_path: String,
}

impl PageFetcher {
    /// Creates a fetcher with its own dedicated client
    pub fn new(config: &SourceConfig) -> Result<Self, SyncError> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: Url::parse(&config.base_url)?,
            first_page_path: config.first_page_path.clone(),
            page_path: config.page_path.clone(),
        })
    }

    /// Builds the URL of a listing page
    ///
    /// Page 1 lives at the fixed listing path; later pages use the paginated
    /// path with `?page=N`. Non-ASCII path characters come out
    /// percent-encoded.
    pub fn page_url(&self, page: u32) -> Result<Url, SyncError> {
        if page <= 1 {
            return Ok(self.base_url.join(&self.first_page_path)?);
        }

        let mut url = self.base_url.join(&self.page_path)?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }

    /// Fetches the raw markup of one listing page
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The response body
    /// * `Err(SyncError::Timeout)` - The request exceeded the timeout
    /// * `Err(SyncError::Http)` - Transport failure
    /// * `Err(SyncError::HttpStatus)` - Non-success status code
    pub async fn fetch(&self, page: u32) -> Result<String, SyncError> {
        let url = self.page_url(page)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(&url, e))
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> SyncError {
    if error.is_timeout() {
        SyncError::Timeout {
            url: url.to_string(),
        }
    } else {
        SyncError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
