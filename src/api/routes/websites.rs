//! Website checks and the system digest

use axum::Json;
use axum::extract::{Query, State};

use crate::WebsiteStatus;
use crate::aggregator::SystemStatusDigest;
use crate::api::state::ApiState;
use crate::api::types::WebsiteQuery;

/// GET /api/check_website?force=bool
pub async fn check_websites(
    State(state): State<ApiState>,
    Query(query): Query<WebsiteQuery>,
) -> Json<Vec<WebsiteStatus>> {
    Json(state.dashboard.check_websites(query.force).await)
}

/// GET /api/system-status
pub async fn system_status(State(state): State<ApiState>) -> Json<SystemStatusDigest> {
    Json(state.dashboard.system_status().await)
}
