//! Energy transaction API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
};
use common::model::transaction::EnergyTransaction;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::response::ApiListResponse;
use crate::error::ApiError;
use crate::AppState;

/// Query parameters for recent transactions
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecentTransactionsQuery {
    /// Maximum number of transactions to return
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

/// List transactions where the user is the consumer
#[utoipa::path(
    get,
    path = "/api/transactions/user/{user_id}",
    params(
        ("user_id" = i64, Path, description = "Consumer user ID")
    ),
    responses(
        (status = 200, description = "Transactions retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "transaction"
)]
pub async fn get_user_transactions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<ApiListResponse<EnergyTransaction>, ApiError> {
    let transactions = state
        .storage
        .transactions_for_user(user_id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(transactions))
}

/// List the most recent transactions across the pool
#[utoipa::path(
    get,
    path = "/api/transactions/recent",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of transactions to return")
    ),
    responses(
        (status = 200, description = "Transactions retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "transaction"
)]
pub async fn get_recent_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentTransactionsQuery>,
) -> Result<ApiListResponse<EnergyTransaction>, ApiError> {
    let transactions = state
        .storage
        .recent_transactions(query.limit)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(transactions))
}
