//! Website roster with snapshot semantics
//!
//! Readers get an `Arc` to an immutable snapshot. A check cycle publishes a
//! whole new snapshot, so nobody ever sees a half-updated website.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;
use url::Url;

use crate::WebsiteStatus;
use crate::config::WebsiteConfig;

/// A monitored website as configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteTarget {
    pub url: Url,
    pub display_name: String,
    pub timeout: std::time::Duration,
}

impl WebsiteTarget {
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn port(&self) -> u16 {
        self.url
            .port_or_known_default()
            .unwrap_or(crate::certificate::DEFAULT_TLS_PORT)
    }
}

impl TryFrom<&WebsiteConfig> for WebsiteTarget {
    type Error = url::ParseError;

    fn try_from(config: &WebsiteConfig) -> Result<Self, Self::Error> {
        let url = Url::parse(&config.url)?;
        let display_name = config
            .display
            .clone()
            .or_else(|| url.host_str().map(str::to_string))
            .unwrap_or_else(|| config.url.clone());

        Ok(Self {
            url,
            display_name,
            timeout: std::time::Duration::from_secs(config.timeout),
        })
    }
}

pub struct WebsiteRegistry {
    targets: Vec<WebsiteTarget>,
    snapshot: RwLock<Arc<Vec<WebsiteStatus>>>,
}

impl WebsiteRegistry {
    pub fn new(targets: Vec<WebsiteTarget>) -> Self {
        let initial = targets
            .iter()
            .map(|t| WebsiteStatus::unchecked(&t.url, &t.display_name))
            .collect();

        Self {
            targets,
            snapshot: RwLock::new(Arc::new(initial)),
        }
    }

    /// Build the roster from configuration, skipping unparseable URLs
    pub fn from_config(websites: &[WebsiteConfig]) -> Self {
        let targets = websites
            .iter()
            .filter_map(|config| match WebsiteTarget::try_from(config) {
                Ok(target) => Some(target),
                Err(e) => {
                    warn!("ignoring website {}: {e}", config.url);
                    None
                }
            })
            .collect();
        Self::new(targets)
    }

    pub fn targets(&self) -> &[WebsiteTarget] {
        &self.targets
    }

    pub async fn snapshot(&self) -> Arc<Vec<WebsiteStatus>> {
        self.snapshot.read().await.clone()
    }

    /// Replace the current snapshot with the result of a check cycle
    pub async fn publish(&self, statuses: Vec<WebsiteStatus>) {
        *self.snapshot.write().await = Arc::new(statuses);
    }
}
