//! Production simulation loop
//!
//! A recurring background task that perturbs each active provider's
//! production figures, recomputes the pool-wide community statistics from
//! scratch, and broadcasts the new aggregates. A failure while updating
//! one provider never aborts the others, and the loop itself never
//! terminates on a tick error.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use common::decimal::{dec, precision, Quantity};
use common::error::Result;
use common::model::stats::CommunityStatsUpdate;
use grid_storage::{GridRepository, ProviderLockRegistry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

use crate::events::{EnergyDataUpdatePayload, GridEvent};
use crate::fanout::ClientRegistry;

/// Tuning knobs for the simulation loop
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Period between ticks
    pub tick_interval: Duration,
    /// Magnitude of the symmetric production perturbation, kWh
    pub production_jitter: f64,
    /// Upper bound of the simulated consumption fraction
    pub max_consumption_ratio: f64,
    /// Fixed utilization factor for the flow-rate estimate
    pub utilization_factor: Decimal,
    /// Externally supplied active-consumer figure for the stats row
    pub active_consumers: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            production_jitter: 1.0,
            max_consumption_ratio: 0.3,
            utilization_factor: dec!(0.7),
            active_consumers: 47,
        }
    }
}

/// Simulation service mutating provider state on a fixed period
pub struct Simulator {
    repo: Arc<dyn GridRepository>,
    locks: Arc<ProviderLockRegistry>,
    registry: Arc<ClientRegistry>,
    config: SimulationConfig,
    rng: Mutex<StdRng>,
}

impl Simulator {
    /// Create a new simulator
    pub fn new(
        repo: Arc<dyn GridRepository>,
        locks: Arc<ProviderLockRegistry>,
        registry: Arc<ClientRegistry>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            repo,
            locks,
            registry,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a simulator with a deterministic RNG
    pub fn with_seed(
        repo: Arc<dyn GridRepository>,
        locks: Arc<ProviderLockRegistry>,
        registry: Arc<ClientRegistry>,
        config: SimulationConfig,
        seed: u64,
    ) -> Self {
        Self {
            repo,
            locks,
            registry,
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Run the recurring loop until the task is aborted
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = self.tick().await {
                error!("Simulation tick failed: {}", e);
            }
        }
    }

    /// Run a single simulation tick
    pub async fn tick(&self) -> Result<()> {
        let providers = self.repo.active_providers().await?;
        debug!("Simulating {} active providers", providers.len());

        for provider in &providers {
            if let Err(e) = self.step_provider(provider.id).await {
                warn!("Simulation update failed for provider {}: {}", provider.id, e);
            }
        }

        // Aggregates are recomputed from scratch over a fresh read, never
        // accumulated incrementally
        let providers = self.repo.active_providers().await?;
        let total_production: Quantity = providers.iter().map(|p| p.current_production).sum();
        let total_available: Quantity = providers.iter().map(|p| p.available_energy).sum();
        let active_providers = providers.len() as i32;

        self.repo
            .upsert_community_stats(CommunityStatsUpdate {
                total_production,
                total_consumption: total_production - total_available,
                active_providers,
                active_consumers: self.config.active_consumers,
                current_flow_rate: total_production * self.config.utilization_factor,
            })
            .await?;

        self.registry
            .broadcast(&GridEvent::EnergyDataUpdate(EnergyDataUpdatePayload {
                total_production,
                total_available,
                active_providers,
            }));

        Ok(())
    }

    /// Perturb one provider and persist the new figures.
    ///
    /// The provider lock is held across the read-modify-write so the step
    /// cannot interleave with a concurrent match against the same provider.
    async fn step_provider(&self, provider_id: i64) -> Result<()> {
        let _guard = self.locks.acquire(provider_id).await;

        let provider = match self.repo.get_provider(provider_id).await? {
            Some(provider) if provider.is_active => provider,
            // Deactivated or deleted since the tick's snapshot
            _ => return Ok(()),
        };

        let (jitter, consumption_ratio) = {
            let mut rng = self.rng.lock().expect("rng lock poisoned");
            (
                rng.gen_range(-self.config.production_jitter..=self.config.production_jitter),
                rng.gen_range(0.0..self.config.max_consumption_ratio),
            )
        };

        let jitter = Decimal::from_f64(jitter).unwrap_or(Decimal::ZERO);
        let ratio = Decimal::from_f64(consumption_ratio).unwrap_or(Decimal::ZERO);

        let current_production = precision::round_energy(
            (provider.current_production + jitter).max(Decimal::ZERO),
        );
        let consumption = ratio * current_production;
        let available_energy = precision::round_energy(
            (current_production - consumption).clamp(Decimal::ZERO, provider.max_capacity),
        );

        self.repo
            .update_provider_energy(provider_id, current_production, available_energy)
            .await
    }
}
