//! Energy request models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Price, Quantity};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// How quickly the consumer needs the energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Immediate,
    Urgent,
    Normal,
    Scheduled,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Immediate => "immediate",
            UrgencyLevel::Urgent => "urgent",
            UrgencyLevel::Normal => "normal",
            UrgencyLevel::Scheduled => "scheduled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "immediate" => Some(UrgencyLevel::Immediate),
            "urgent" => Some(UrgencyLevel::Urgent),
            "normal" => Some(UrgencyLevel::Normal),
            "scheduled" => Some(UrgencyLevel::Scheduled),
            _ => None,
        }
    }
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        UrgencyLevel::Normal
    }
}

/// Request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting a match
    Pending,
    /// Bound to a provider
    Matched,
    /// Energy has been delivered
    Fulfilled,
    /// Withdrawn by the consumer
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Matched => "matched",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "matched" => Some(RequestStatus::Matched),
            "fulfilled" => Some(RequestStatus::Fulfilled),
            "cancelled" => Some(RequestStatus::Cancelled),
            _ => None,
        }
    }
}

/// Energy request model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EnergyRequest {
    /// Unique request ID
    pub id: i64,
    /// Requesting user ID
    pub user_id: i64,
    /// Requested amount in kWh, always positive
    pub energy_amount: Quantity,
    /// Urgency tag
    pub urgency_level: UrgencyLevel,
    /// Free-form preferred delivery window
    pub preferred_time_slot: Option<String>,
    /// Maximum acceptable price per kWh
    pub max_price: Option<Price>,
    /// Current status
    pub status: RequestStatus,
    /// Provider bound by matching, set at status `matched` or later
    pub matched_provider_id: Option<i64>,
    /// Submission timestamp
    pub created_at: DateTime<Utc>,
    /// Scheduled delivery time, if any
    pub requested_for: Option<DateTime<Utc>>,
}

impl EnergyRequest {
    /// Check whether the request is still awaiting a match
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Payload for submitting a new request
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewEnergyRequest {
    pub user_id: i64,
    pub energy_amount: Quantity,
    #[serde(default)]
    pub urgency_level: UrgencyLevel,
    #[serde(default)]
    pub preferred_time_slot: Option<String>,
    #[serde(default)]
    pub max_price: Option<Price>,
    #[serde(default)]
    pub requested_for: Option<DateTime<Utc>>,
}
