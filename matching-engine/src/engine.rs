use std::sync::Arc;

use common::decimal::{dec, Price};
use common::error::{Error, Result};
use common::model::provider::EnergyProvider;
use common::model::request::EnergyRequest;
use common::model::transaction::{EnergyTransaction, NewEnergyTransaction};
use energy_data::{ClientRegistry, GridEvent, MatchFoundPayload};
use grid_storage::{GridRepository, ProviderLockRegistry};
use tracing::{debug, info};

/// Fallback price per kWh for providers that have not set one
pub const DEFAULT_PRICE_PER_KWH: Price = dec!(0.15);

/// Result of a matching attempt.
///
/// `Unmatched` is a normal outcome, not a fault: the request simply stays
/// pending until a provider with enough available energy appears.
#[derive(Debug)]
pub enum MatchOutcome {
    /// The request was bound to a provider
    Matched(MatchDetails),
    /// No suitable provider was available
    Unmatched,
}

impl MatchOutcome {
    /// Whether this outcome bound the request to a provider
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

/// Everything produced by a successful match
#[derive(Debug)]
pub struct MatchDetails {
    /// The request, now in state `matched`
    pub request: EnergyRequest,
    /// The selected provider, with its availability already debited
    pub provider: EnergyProvider,
    /// The transaction recorded for the match
    pub transaction: EnergyTransaction,
}

/// The matching engine responsible for binding requests to providers
pub struct MatchingEngine {
    repo: Arc<dyn GridRepository>,
    locks: Arc<ProviderLockRegistry>,
    registry: Arc<ClientRegistry>,
}

impl MatchingEngine {
    /// Create a new matching engine
    pub fn new(
        repo: Arc<dyn GridRepository>,
        locks: Arc<ProviderLockRegistry>,
        registry: Arc<ClientRegistry>,
    ) -> Self {
        Self {
            repo,
            locks,
            registry,
        }
    }

    /// Attempt to match a pending request against the active providers.
    ///
    /// Scans providers that can cover the requested amount and selects the
    /// one with the most available energy; ties resolve to the lowest
    /// provider id. On success the request transitions to `matched`, the
    /// provider's availability is debited, a pending transaction is
    /// recorded, and a `match_found` event is broadcast.
    pub async fn match_request(&self, request_id: i64) -> Result<MatchOutcome> {
        let request = self
            .repo
            .get_request(request_id)
            .await?
            .ok_or_else(|| Error::RequestNotFound(format!("Request not found: {}", request_id)))?;

        if !request.is_pending() {
            debug!("Request {} is not pending, skipping match", request_id);
            return Ok(MatchOutcome::Unmatched);
        }

        let providers = self.repo.matchable_providers().await?;

        let best = providers
            .iter()
            .filter(|p| p.available_energy >= request.energy_amount)
            // Ties on available energy resolve to the lowest id: a lower id
            // compares greater, and ids are unique so the order is total
            .max_by(|a, b| {
                a.available_energy
                    .cmp(&b.available_energy)
                    .then_with(|| b.id.cmp(&a.id))
            });

        let best = match best {
            Some(provider) => provider,
            None => {
                debug!(
                    "No suitable provider for request {} ({} kWh)",
                    request_id, request.energy_amount
                );
                return Ok(MatchOutcome::Unmatched);
            }
        };

        // Serialize against other matches and simulation writes touching
        // this provider
        let _guard = self.locks.acquire(best.id).await;

        let provider = match self
            .repo
            .debit_available_energy(best.id, request.energy_amount)
            .await?
        {
            Some(provider) => provider,
            None => {
                // The candidate lost its availability between the scan and
                // the debit; the request stays pending
                debug!(
                    "Provider {} could no longer cover {} kWh for request {}",
                    best.id, request.energy_amount, request_id
                );
                return Ok(MatchOutcome::Unmatched);
            }
        };

        let request = self
            .repo
            .mark_request_matched(request.id, provider.id)
            .await?;

        let price_per_kwh = provider.price_per_kwh.unwrap_or(DEFAULT_PRICE_PER_KWH);
        let transaction = self
            .repo
            .create_transaction(NewEnergyTransaction::for_match(
                request.id,
                provider.id,
                request.user_id,
                request.energy_amount,
                price_per_kwh,
            ))
            .await?;

        info!(
            "Matched request {} to provider {}: {} kWh at {}/kWh",
            request.id, provider.id, request.energy_amount, price_per_kwh
        );

        self.registry
            .broadcast(&GridEvent::MatchFound(MatchFoundPayload {
                request_id: request.id,
                provider_id: provider.id,
                transaction: transaction.clone(),
            }));

        Ok(MatchOutcome::Matched(MatchDetails {
            request,
            provider,
            transaction,
        }))
    }
}
