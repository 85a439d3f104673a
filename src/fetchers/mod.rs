//! Per-source fetchers
//!
//! Every fetcher turns one identity (a module, a provider, a website, ...)
//! into one normalized result. Failures never cross the fetcher boundary:
//! they are logged and folded into the returned record.

pub mod eol;
pub mod forge;
pub mod github;
pub mod terraform;
pub mod vendor;
pub mod website;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::ErrorKind;

pub use eol::{EolCycle, EolDate, EolFetcher};
pub use forge::ForgeFetcher;
pub use github::GitHubFetcher;
pub use terraform::TerraformFetcher;
pub use vendor::VendorFetcher;
pub use website::WebsiteFetcher;

/// Why a single upstream call failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("timeout")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream answered with HTTP {status}")]
    Upstream { status: u16 },

    #[error("parse error: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Timeout => ErrorKind::Timeout,
            FetchError::Transport(_) => ErrorKind::Transport,
            FetchError::Upstream { .. } => ErrorKind::Upstream,
            FetchError::Parse(_) => ErrorKind::Parse,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Upstream {
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// One upstream source
///
/// `fetch` must not fail: whatever goes wrong is part of `Output`.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    type Identity: Send + Sync;
    type Output: Send;

    /// Short name of the source, used in logs
    fn source(&self) -> &'static str;

    async fn fetch(&self, identity: &Self::Identity) -> Self::Output;
}

/// HTTP access to one upstream API
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            timeout,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url`, anything but HTTP 200 is an upstream error
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        trace!("GET {url}");
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.get(url).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.get(url).await?.text().await?)
    }
}
