//! Energy provider API handlers
//!
//! Handlers for provider registration, listing, and manual energy updates.
//! Provider registration and energy updates broadcast change events to
//! connected clients.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::decimal::Quantity;
use common::model::provider::{EnergyProvider, NewEnergyProvider};
use energy_data::{EnergyUpdatePayload, GridEvent};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::error::ApiError;
use crate::AppState;

/// Manual energy update request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnergyRequest {
    /// New current production in kWh
    pub current_production: Quantity,
    /// New available energy in kWh
    pub available_energy: Quantity,
}

/// List providers available for matching
#[utoipa::path(
    get,
    path = "/api/providers",
    responses(
        (status = 200, description = "Providers retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "provider"
)]
pub async fn get_providers(
    State(state): State<Arc<AppState>>,
) -> Result<ApiListResponse<EnergyProvider>, ApiError> {
    let providers = state
        .storage
        .matchable_providers()
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(providers))
}

/// Register a new provider
#[utoipa::path(
    post,
    path = "/api/providers",
    request_body = NewEnergyProvider,
    responses(
        (status = 200, description = "Provider registered successfully"),
        (status = 400, description = "Invalid provider data"),
        (status = 500, description = "Internal server error")
    ),
    tag = "provider"
)]
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewEnergyProvider>,
) -> Result<ApiResponse<EnergyProvider>, ApiError> {
    let provider = state
        .storage
        .register_provider(request)
        .await
        .map_err(ApiError::Common)?;

    state
        .registry
        .broadcast(&GridEvent::ProviderAdded(provider.clone()));

    Ok(ApiResponse::new(provider))
}

/// List providers owned by a user
#[utoipa::path(
    get,
    path = "/api/providers/user/{user_id}",
    params(
        ("user_id" = i64, Path, description = "Owning user ID")
    ),
    responses(
        (status = 200, description = "Providers retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "provider"
)]
pub async fn get_user_providers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<ApiListResponse<EnergyProvider>, ApiError> {
    let providers = state
        .storage
        .providers_for_user(user_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(providers))
}

/// Manually update a provider's energy figures
#[utoipa::path(
    put,
    path = "/api/providers/{id}/energy",
    params(
        ("id" = i64, Path, description = "Provider ID")
    ),
    request_body = UpdateEnergyRequest,
    responses(
        (status = 200, description = "Energy data updated successfully"),
        (status = 404, description = "Provider not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "provider"
)]
pub async fn update_provider_energy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEnergyRequest>,
) -> Result<ApiResponse<EnergyProvider>, ApiError> {
    // The energy fields are shared with the matching engine and the
    // simulation loop; writes go through the provider lock
    let provider = {
        let _guard = state.locks.acquire(id).await;
        state
            .storage
            .update_provider_energy(id, request.current_production, request.available_energy)
            .await
            .map_err(ApiError::Common)?
    };

    state
        .registry
        .broadcast(&GridEvent::EnergyUpdate(EnergyUpdatePayload {
            provider_id: provider.id,
            current_production: provider.current_production,
            available_energy: provider.available_energy,
        }));

    Ok(ApiResponse::new(provider))
}
