//! Cache backend trait definition
//!
//! Backends store opaque bytes with a per-entry time to live. Typed access
//! lives one layer up in [`FreshnessCache`](super::FreshnessCache), so a
//! backend can be swapped without touching any call site.

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheResult;

/// Health status of a cache backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: String,
}

/// Trait for key/value stores with expiring entries
///
/// Implementations must be `Send + Sync`, they are shared between the API
/// handlers and the pollers.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Value stored under `key`, `None` if absent or expired
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key` for `ttl`, replacing any previous value
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Remove `key`, a missing key is not an error
    async fn delete(&self, key: &str) -> CacheResult<()>;

    async fn health_check(&self) -> CacheResult<HealthStatus>;
}
