//! Community statistics models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Quantity;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Aggregate snapshot of pool-wide production and consumption.
///
/// Logically a singleton row, recomputed from scratch on every
/// simulation tick and upserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    /// Row ID
    pub id: i64,
    /// Sum of current production over active providers, kWh
    pub total_production: Quantity,
    /// Production minus available energy, kWh
    pub total_consumption: Quantity,
    /// Number of active providers
    pub active_providers: i32,
    /// Number of active consumers (externally supplied figure)
    pub active_consumers: i32,
    /// Estimated current flow rate, kWh
    pub current_flow_rate: Quantity,
    /// Last recomputation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Upsert payload for the stats row
#[derive(Debug, Clone, Default)]
pub struct CommunityStatsUpdate {
    pub total_production: Quantity,
    pub total_consumption: Quantity,
    pub active_providers: i32,
    pub active_consumers: i32,
    pub current_flow_rate: Quantity,
}
