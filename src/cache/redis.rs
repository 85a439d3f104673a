//! Redis cache backend
//!
//! Shared between processes, so always-on deployments keep their cache
//! across restarts. Keys are namespaced with a configurable prefix.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, info, instrument};

use super::backend::{CacheBackend, HealthStatus};
use super::error::{CacheError, CacheResult};

pub struct RedisBackend {
    connection: ConnectionManager,
    key_prefix: String,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connect and verify the server answers `PING`
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> CacheResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::InvalidConfig(e.to_string()))?;

        let mut connection = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;

        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        info!("connected to redis cache");

        Ok(Self {
            connection,
            key_prefix: key_prefix.into(),
        })
    }

    fn key(&self, key: &str) -> String {
        prefixed(&self.key_prefix, key)
    }
}

fn prefixed(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

/// `SET EX` needs a whole number of seconds, at least one
fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = connection.get(self.key(key)).await?;
        debug!("redis get {key}: {}", if value.is_some() { "hit" } else { "miss" });
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let mut connection = self.connection.clone();
        let _: () = connection
            .set_ex(self.key(key), value, expiry_seconds(ttl))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(self.key(key)).await?;
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<HealthStatus> {
        let mut connection = self.connection.clone();
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut connection).await;
        let status = match pong {
            Ok(_) => HealthStatus {
                healthy: true,
                message: "redis reachable".to_string(),
            },
            Err(e) => HealthStatus {
                healthy: false,
                message: format!("redis unreachable: {e}"),
            },
        };
        Ok(status)
    }
}
