//! Energy transaction models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Price, Quantity};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created by a match, delivery not started
    Pending,
    /// Energy is flowing
    Active,
    /// Delivery finished
    Completed,
    /// Delivery aborted
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Active => "active",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "active" => Some(TransactionStatus::Active),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// Energy transaction model representing a successful match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EnergyTransaction {
    /// Unique transaction ID
    pub id: i64,
    /// Matched request ID
    pub request_id: i64,
    /// Supplying provider ID
    pub provider_id: i64,
    /// Consuming user ID
    pub consumer_id: i64,
    /// Energy amount in kWh
    pub energy_amount: Quantity,
    /// Agreed price per kWh
    pub price_per_kwh: Price,
    /// Total price, equals energy_amount * price_per_kwh at creation
    pub total_price: Amount,
    /// Current status
    pub status: TransactionStatus,
    /// Delivery start time
    pub start_time: Option<DateTime<Utc>>,
    /// Delivery end time
    pub end_time: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a transaction, created by the matching engine
#[derive(Debug, Clone)]
pub struct NewEnergyTransaction {
    pub request_id: i64,
    pub provider_id: i64,
    pub consumer_id: i64,
    pub energy_amount: Quantity,
    pub price_per_kwh: Price,
    pub total_price: Amount,
    pub status: TransactionStatus,
}

impl NewEnergyTransaction {
    /// Build a pending transaction for a match, computing the total price
    pub fn for_match(
        request_id: i64,
        provider_id: i64,
        consumer_id: i64,
        energy_amount: Quantity,
        price_per_kwh: Price,
    ) -> Self {
        Self {
            request_id,
            provider_id,
            consumer_id,
            energy_amount,
            price_per_kwh,
            total_price: energy_amount * price_per_kwh,
            status: TransactionStatus::Pending,
        }
    }
}
