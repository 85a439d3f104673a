//! Freshness cache
//!
//! Typed get/set/delete with a per-entry time to live on top of a swappable
//! [`CacheBackend`]. Values are stored as JSON.

pub mod backend;
pub mod error;
pub mod memory;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

pub use backend::{CacheBackend, HealthStatus};
pub use error::{CacheError, CacheResult};
pub use memory::MemoryBackend;
pub use self::redis::RedisBackend;

use crate::config::CacheConfig;

/// Collection level cache keys
pub mod keys {
    pub const MODULES: &str = "modules";
    pub const TERRAFORM_PROVIDERS: &str = "terraform_providers";
    pub const WEBSITES: &str = "websites";
    pub const GITHUB_RELEASES: &str = "github_releases";
    pub const VENDOR_VERSIONS: &str = "vendor_versions";

    pub fn eol(platform: &str) -> String {
        format!("eol:{platform}")
    }

    /// Last known liveness of one website
    pub fn website_state(url: &str) -> String {
        format!("website_state:{url}")
    }
}

#[derive(Clone)]
pub struct FreshnessCache {
    backend: Arc<dyn CacheBackend>,
}

impl FreshnessCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Build the configured backend.
    ///
    /// `REDIS_URL` wins over the configuration file. A redis server that
    /// cannot be reached at startup leaves the process on the in-memory
    /// backend.
    pub async fn from_config(config: &CacheConfig, redis_url: Option<String>) -> Self {
        let redis = match (redis_url, config) {
            (Some(url), CacheConfig::Redis { key_prefix, .. }) => Some((url, key_prefix.clone())),
            (Some(url), CacheConfig::Memory) => Some((url, "opsboard:".to_string())),
            (None, CacheConfig::Redis { url, key_prefix }) => Some((url.clone(), key_prefix.clone())),
            (None, CacheConfig::Memory) => None,
        };

        let Some((url, key_prefix)) = redis else {
            info!("using in-memory cache");
            return Self::memory();
        };

        match RedisBackend::connect(&url, key_prefix).await {
            Ok(backend) => Self::new(Arc::new(backend)),
            Err(e) => {
                warn!("redis cache unavailable ({e}), falling back to in-memory cache");
                Self::memory()
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.backend.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, bytes, ttl).await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.backend.delete(key).await
    }

    pub async fn health_check(&self) -> CacheResult<HealthStatus> {
        self.backend.health_check().await
    }
}
