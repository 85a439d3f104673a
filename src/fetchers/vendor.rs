//! Version scraped from a vendor download page
//!
//! The page is matched against a regex with one capture group. A page that
//! does not match is a parse failure like any other.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{instrument, warn};

use super::{FetchError, HttpSource, SourceFetcher};
use crate::StatusRecord;
use crate::config::VendorConfig;
use crate::version::Comparison;

/// A vendor page with its compiled pattern
#[derive(Debug, Clone)]
pub struct VendorPage {
    pub name: String,
    pub url: String,
    pub pattern: Regex,
    pub installed: Option<String>,
}

impl TryFrom<&VendorConfig> for VendorPage {
    type Error = regex::Error;

    fn try_from(config: &VendorConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            name: config.name.clone(),
            url: config.url.clone(),
            pattern: Regex::new(&config.pattern)?,
            installed: config.installed.clone(),
        })
    }
}

/// First capture group of `pattern` in `body`, or the whole match if the
/// pattern has no group
pub fn extract_version(pattern: &Regex, body: &str) -> Option<String> {
    let captures = pattern.captures(body)?;
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct VendorFetcher {
    client: Client,
    timeout: std::time::Duration,
}

impl VendorFetcher {
    pub fn new(client: Client, timeout: std::time::Duration) -> Self {
        Self { client, timeout }
    }

    async fn try_fetch(&self, page: &VendorPage) -> Result<String, FetchError> {
        let http = HttpSource::new(self.client.clone(), page.url.as_str(), self.timeout);
        let body = http.get_text(&page.url).await?;

        extract_version(&page.pattern, &body).ok_or_else(|| {
            FetchError::Parse(format!("version pattern not found on {}", page.url))
        })
    }
}

#[async_trait]
impl SourceFetcher for VendorFetcher {
    type Identity = VendorPage;
    type Output = StatusRecord;

    fn source(&self) -> &'static str {
        "vendor"
    }

    #[instrument(skip(self, page), fields(vendor = %page.name))]
    async fn fetch(&self, page: &VendorPage) -> StatusRecord {
        let record = StatusRecord::new(&page.name)
            .installed(page.installed.as_deref())
            .meta("url", &page.url);

        match self.try_fetch(page).await {
            Ok(latest) => record.resolved(&latest, false, Comparison::Loose),
            Err(e) => {
                warn!("failed to scrape version of {}: {e}", page.name);
                record.failed(&e)
            }
        }
    }
}
