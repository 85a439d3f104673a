//! Request and response types of the API that are not domain records

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    /// "ok", or "degraded" while the cache backend is unhealthy
    pub status: String,
    pub timestamp: String,
    pub cache: CacheHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheHealth {
    pub backend: String,
    pub healthy: bool,
    pub message: String,
}

/// Query of `GET /api/check_website`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WebsiteQuery {
    /// Skip the cache and check every website now
    #[serde(default)]
    pub force: bool,
}

/// Answer of `POST /api/software_versions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoftwareCreated {
    pub index: usize,
}
