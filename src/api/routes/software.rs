//! Manually maintained software versions, addressed by list index

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::api::error::ApiResult;
use crate::api::state::ApiState;
use crate::api::types::SoftwareCreated;
use crate::software::SoftwareVersion;

/// GET /api/software_versions
pub async fn list_software(State(state): State<ApiState>) -> ApiResult<Json<Vec<SoftwareVersion>>> {
    Ok(Json(state.software.list().await?))
}

/// POST /api/software_versions
pub async fn create_software(
    State(state): State<ApiState>,
    Json(entry): Json<SoftwareVersion>,
) -> ApiResult<(StatusCode, Json<SoftwareCreated>)> {
    let index = state.software.create(entry).await?;
    Ok((StatusCode::CREATED, Json(SoftwareCreated { index })))
}

/// PUT /api/software_versions/:index
pub async fn replace_software(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
    Json(entry): Json<SoftwareVersion>,
) -> ApiResult<Json<SoftwareVersion>> {
    state.software.replace(index, entry.clone()).await?;
    Ok(Json(entry))
}

/// DELETE /api/software_versions/:index
pub async fn remove_software(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
) -> ApiResult<Json<SoftwareVersion>> {
    Ok(Json(state.software.remove(index).await?))
}
