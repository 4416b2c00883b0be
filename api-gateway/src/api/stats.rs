//! Community statistics API handlers

use std::sync::Arc;

use axum::extract::State;
use common::model::stats::CommunityStats;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Get the community statistics snapshot
#[utoipa::path(
    get,
    path = "/api/community/stats",
    responses(
        (status = 200, description = "Community stats retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "stats"
)]
pub async fn get_community_stats(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<CommunityStats>, ApiError> {
    // Initializes a zeroed singleton row on first access
    let stats = state
        .storage
        .community_stats()
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(stats))
}
