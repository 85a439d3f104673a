//! Version and lifecycle collections
//!
//! Record lists always answer 200, failed items are part of the list.

use axum::Json;
use axum::extract::{Path, State};

use crate::StatusRecord;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::ApiState;
use crate::fetchers::EolCycle;

/// GET /api/modules
pub async fn list_modules(State(state): State<ApiState>) -> Json<Vec<StatusRecord>> {
    Json(state.dashboard.list_modules().await)
}

/// GET /api/eol/:system
pub async fn list_eol_versions(
    State(state): State<ApiState>,
    Path(system): Path<String>,
) -> ApiResult<Json<Vec<EolCycle>>> {
    state
        .dashboard
        .list_eol_versions(&system)
        .await
        .map(Json)
        .map_err(|e| ApiError::Upstream(format!("Failed to fetch {system} EOL data: {e}")))
}

/// GET /api/terraform-providers
pub async fn list_terraform_providers(State(state): State<ApiState>) -> Json<Vec<StatusRecord>> {
    Json(state.dashboard.list_terraform_providers().await)
}

/// GET /api/github-releases
pub async fn list_github_releases(State(state): State<ApiState>) -> Json<Vec<StatusRecord>> {
    Json(state.dashboard.list_github_releases().await)
}

/// GET /api/vendor-versions
pub async fn list_vendor_versions(State(state): State<ApiState>) -> Json<Vec<StatusRecord>> {
    Json(state.dashboard.list_vendor_versions().await)
}
