//! User API handlers
//!
//! Handles registration, login, and user lookup. Credentials are compared
//! verbatim; trust is assumed to come from an outer layer.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::model::user::{NewUser, User};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = NewUser,
    responses(
        (status = 200, description = "User registered successfully"),
        (status = 400, description = "Invalid user data or duplicate username/email"),
        (status = 500, description = "Internal server error")
    ),
    tag = "user"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewUser>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state
        .storage
        .register_user(request)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(user))
}

/// Log a user in
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "user"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state
        .storage
        .authenticate(&request.username, &request.password)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(user))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User retrieved successfully"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "user"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state
        .storage
        .get_user(id)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", id)))?;

    Ok(ApiResponse::new(user))
}
