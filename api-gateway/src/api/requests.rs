//! Energy request API handlers
//!
//! Request submission runs the matching engine synchronously: the caller
//! is not acknowledged until a match has been attempted. A failed match is
//! a normal outcome and leaves the request pending.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::model::request::{EnergyRequest, NewEnergyRequest};
use energy_data::GridEvent;
use matching_engine::MatchOutcome;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::error::ApiError;
use crate::AppState;

/// List pending requests
#[utoipa::path(
    get,
    path = "/api/requests",
    responses(
        (status = 200, description = "Pending requests retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "request"
)]
pub async fn get_requests(
    State(state): State<Arc<AppState>>,
) -> Result<ApiListResponse<EnergyRequest>, ApiError> {
    let requests = state
        .storage
        .pending_requests()
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(requests))
}

/// Submit a new energy request
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = NewEnergyRequest,
    responses(
        (status = 200, description = "Request submitted; matching has been attempted"),
        (status = 400, description = "Invalid request data"),
        (status = 500, description = "Internal server error")
    ),
    tag = "request"
)]
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewEnergyRequest>,
) -> Result<ApiResponse<EnergyRequest>, ApiError> {
    let created = state
        .storage
        .submit_request(request)
        .await
        .map_err(ApiError::Common)?;

    // Matching runs synchronously before the submission is acknowledged;
    // the engine broadcasts match_found itself on success
    let outcome = state
        .matching_engine
        .match_request(created.id)
        .await
        .map_err(ApiError::Common)?;

    state
        .registry
        .broadcast(&GridEvent::NewRequest(created.clone()));

    let request = match outcome {
        MatchOutcome::Matched(details) => details.request,
        MatchOutcome::Unmatched => created,
    };

    Ok(ApiResponse::new(request))
}

/// List requests submitted by a user
#[utoipa::path(
    get,
    path = "/api/requests/user/{user_id}",
    params(
        ("user_id" = i64, Path, description = "Requesting user ID")
    ),
    responses(
        (status = 200, description = "Requests retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "request"
)]
pub async fn get_user_requests(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<ApiListResponse<EnergyRequest>, ApiError> {
    let requests = state
        .storage
        .requests_for_user(user_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(requests))
}
