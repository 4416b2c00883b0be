//! Energy provider models and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Price, Quantity};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Kind of energy-producing device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum EnergyType {
    Solar,
    Wind,
    Battery,
}

impl EnergyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyType::Solar => "solar",
            EnergyType::Wind => "wind",
            EnergyType::Battery => "battery",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "solar" => Some(EnergyType::Solar),
            "wind" => Some(EnergyType::Wind),
            "battery" => Some(EnergyType::Battery),
            _ => None,
        }
    }
}

/// Energy provider model representing a registered producing device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EnergyProvider {
    /// Unique provider ID
    pub id: i64,
    /// Owning user ID
    pub user_id: i64,
    /// Human-readable device name
    pub provider_name: String,
    /// Kind of producing device
    pub energy_type: EnergyType,
    /// Maximum capacity in kWh
    pub max_capacity: Quantity,
    /// Current production in kWh
    pub current_production: Quantity,
    /// Energy currently available for matching in kWh
    pub available_energy: Quantity,
    /// Asking price per kWh, if set
    pub price_per_kwh: Option<Price>,
    /// Device latitude
    pub latitude: Option<Decimal>,
    /// Device longitude
    pub longitude: Option<Decimal>,
    /// Whether the provider participates in matching and simulation
    pub is_active: bool,
    /// Last update timestamp
    pub last_updated: DateTime<Utc>,
}

impl EnergyProvider {
    /// Check whether the provider can cover a requested amount
    pub fn can_supply(&self, amount: Quantity) -> bool {
        self.is_active && self.available_energy >= amount
    }
}

/// Payload for registering a new provider
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewEnergyProvider {
    pub user_id: i64,
    pub provider_name: String,
    pub energy_type: EnergyType,
    pub max_capacity: Quantity,
    #[serde(default)]
    pub current_production: Quantity,
    #[serde(default)]
    pub available_energy: Quantity,
    #[serde(default)]
    pub price_per_kwh: Option<Price>,
    #[serde(default)]
    pub latitude: Option<Decimal>,
    #[serde(default)]
    pub longitude: Option<Decimal>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}
