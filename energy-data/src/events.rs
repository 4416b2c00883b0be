//! Event messages broadcast to connected clients
//!
//! Every event serializes to a `{ "type": ..., "data": ... }` envelope,
//! one JSON object per message.

use common::decimal::Quantity;
use common::model::provider::EnergyProvider;
use common::model::request::EnergyRequest;
use common::model::transaction::EnergyTransaction;
use serde::Serialize;

/// Payload of a `match_found` event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFoundPayload {
    /// Matched request ID
    pub request_id: i64,
    /// Selected provider ID
    pub provider_id: i64,
    /// The transaction created for the match
    pub transaction: EnergyTransaction,
}

/// Payload of an `energy_update` event, sent after a manual provider update
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyUpdatePayload {
    pub provider_id: i64,
    pub current_production: Quantity,
    pub available_energy: Quantity,
}

/// Payload of an `energy_data_update` event, sent on every simulation tick
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyDataUpdatePayload {
    pub total_production: Quantity,
    pub total_available: Quantity,
    pub active_providers: i32,
}

/// Events broadcast over the socket channel
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GridEvent {
    /// A request was submitted
    NewRequest(EnergyRequest),
    /// The matching engine bound a request to a provider
    MatchFound(MatchFoundPayload),
    /// A provider was registered
    ProviderAdded(EnergyProvider),
    /// A provider's energy figures were updated manually
    EnergyUpdate(EnergyUpdatePayload),
    /// Pool-wide aggregates from a simulation tick
    EnergyDataUpdate(EnergyDataUpdatePayload),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::decimal::dec;
    use common::model::transaction::TransactionStatus;

    #[test]
    fn match_found_envelope() {
        let event = GridEvent::MatchFound(MatchFoundPayload {
            request_id: 3,
            provider_id: 9,
            transaction: EnergyTransaction {
                id: 1,
                request_id: 3,
                provider_id: 9,
                consumer_id: 5,
                energy_amount: dec!(5.0),
                price_per_kwh: dec!(0.20),
                total_price: dec!(1.00),
                status: TransactionStatus::Pending,
                start_time: None,
                end_time: None,
                created_at: Utc::now(),
            },
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "match_found");
        assert_eq!(value["data"]["requestId"], 3);
        assert_eq!(value["data"]["providerId"], 9);
        assert_eq!(value["data"]["transaction"]["totalPrice"], "1.00");
    }

    #[test]
    fn energy_data_update_envelope() {
        let event = GridEvent::EnergyDataUpdate(EnergyDataUpdatePayload {
            total_production: dec!(42.5),
            total_available: dec!(30.0),
            active_providers: 4,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "energy_data_update");
        assert_eq!(value["data"]["totalProduction"], "42.5");
        assert_eq!(value["data"]["totalAvailable"], "30.0");
        assert_eq!(value["data"]["activeProviders"], 4);
    }

    #[test]
    fn energy_update_envelope() {
        let event = GridEvent::EnergyUpdate(EnergyUpdatePayload {
            provider_id: 7,
            current_production: dec!(3.2),
            available_energy: dec!(2.4),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "energy_update");
        assert_eq!(value["data"]["providerId"], 7);
    }
}
