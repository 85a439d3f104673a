//! Health check endpoint

use axum::Json;
use axum::extract::State;

use crate::api::state::ApiState;
use crate::api::types::{CacheHealth, HealthResponse};

/// GET /api/health
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let cache = state.dashboard.health().await;

    Json(HealthResponse {
        status: if cache.healthy { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        cache: CacheHealth {
            backend: state.dashboard.cache().backend_name().to_string(),
            healthy: cache.healthy,
            message: cache.message,
        },
    })
}
