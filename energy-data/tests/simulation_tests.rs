use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::decimal::{dec, Quantity};
use common::error::{Error, Result};
use common::model::provider::{EnergyProvider, EnergyType, NewEnergyProvider};
use common::model::request::{EnergyRequest, NewEnergyRequest};
use common::model::stats::{CommunityStats, CommunityStatsUpdate};
use common::model::transaction::{EnergyTransaction, NewEnergyTransaction};
use common::model::user::{NewUser, User};
use energy_data::{ClientRegistry, OutboundFrame, SimulationConfig, Simulator};
use grid_storage::{GridRepository, InMemoryGridRepository, ProviderLockRegistry};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

fn test_config() -> SimulationConfig {
    SimulationConfig {
        tick_interval: Duration::from_millis(10),
        ..SimulationConfig::default()
    }
}

async fn seed_provider(
    repo: &dyn GridRepository,
    name: &str,
    production: Decimal,
    available: Decimal,
    max_capacity: Decimal,
) -> EnergyProvider {
    repo.create_provider(NewEnergyProvider {
        user_id: 1,
        provider_name: name.to_string(),
        energy_type: EnergyType::Solar,
        max_capacity,
        current_production: production,
        available_energy: available,
        price_per_kwh: Some(dec!(0.20)),
        latitude: None,
        longitude: None,
        is_active: true,
    })
    .await
    .unwrap()
}

fn simulator(repo: Arc<dyn GridRepository>, registry: Arc<ClientRegistry>, seed: u64) -> Simulator {
    Simulator::with_seed(
        repo,
        Arc::new(ProviderLockRegistry::new()),
        registry,
        test_config(),
        seed,
    )
}

#[tokio::test]
async fn providers_stay_within_bounds_over_many_ticks() {
    let repo = Arc::new(InMemoryGridRepository::new());
    seed_provider(repo.as_ref(), "small", dec!(0.5), dec!(0.5), dec!(2.0)).await;
    seed_provider(repo.as_ref(), "medium", dec!(5.0), dec!(4.0), dec!(8.0)).await;
    seed_provider(repo.as_ref(), "large", dec!(20.0), dec!(18.0), dec!(25.0)).await;

    let sim = simulator(repo.clone(), Arc::new(ClientRegistry::new()), 7);

    for _ in 0..50 {
        sim.tick().await.unwrap();
        for provider in repo.active_providers().await.unwrap() {
            assert!(
                provider.available_energy >= Quantity::ZERO,
                "available energy went negative for {}",
                provider.provider_name
            );
            assert!(
                provider.available_energy <= provider.max_capacity,
                "available energy exceeded capacity for {}",
                provider.provider_name
            );
            assert!(provider.current_production >= Quantity::ZERO);
        }
    }
}

#[tokio::test]
async fn stats_recomputed_from_scratch() {
    let repo = Arc::new(InMemoryGridRepository::new());
    seed_provider(repo.as_ref(), "a", dec!(3.0), dec!(2.0), dec!(10.0)).await;
    seed_provider(repo.as_ref(), "b", dec!(7.0), dec!(6.0), dec!(10.0)).await;

    let sim = simulator(repo.clone(), Arc::new(ClientRegistry::new()), 42);

    // Two ticks: the second must overwrite, not accumulate
    sim.tick().await.unwrap();
    sim.tick().await.unwrap();

    let providers = repo.active_providers().await.unwrap();
    let expected_production: Quantity = providers.iter().map(|p| p.current_production).sum();
    let expected_available: Quantity = providers.iter().map(|p| p.available_energy).sum();

    let stats = repo.community_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_production, expected_production);
    assert_eq!(
        stats.total_consumption,
        expected_production - expected_available
    );
    assert_eq!(stats.active_providers, 2);
    assert_eq!(stats.active_consumers, 47);
    assert_eq!(
        stats.current_flow_rate,
        expected_production * dec!(0.7)
    );
}

#[tokio::test]
async fn tick_broadcasts_energy_data_update() {
    let repo = Arc::new(InMemoryGridRepository::new());
    seed_provider(repo.as_ref(), "a", dec!(3.0), dec!(2.0), dec!(10.0)).await;

    let registry = Arc::new(ClientRegistry::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    registry.register(tx);

    let sim = simulator(repo.clone(), registry, 11);
    sim.tick().await.unwrap();

    let frame = rx.try_recv().unwrap();
    let message = match frame {
        OutboundFrame::Event(message) => message,
        other => panic!("expected event frame, got {:?}", other),
    };
    let value: serde_json::Value = serde_json::from_str(&message).unwrap();
    assert_eq!(value["type"], "energy_data_update");
    assert_eq!(value["data"]["activeProviders"], 1);

    let stats = repo.community_stats().await.unwrap().unwrap();
    assert_eq!(
        value["data"]["totalProduction"],
        stats.total_production.to_string()
    );
}

#[tokio::test]
async fn drained_provider_keeps_simulating() {
    let repo = Arc::new(InMemoryGridRepository::new());
    let drained = seed_provider(repo.as_ref(), "drained", dec!(4.0), dec!(0.0), dec!(10.0)).await;

    let sim = simulator(repo.clone(), Arc::new(ClientRegistry::new()), 3);
    sim.tick().await.unwrap();

    let after = repo.get_provider(drained.id).await.unwrap().unwrap();
    // The tick touched the provider even though it had nothing available
    assert!(after.last_updated > drained.last_updated);
}

/// Repository double that fails energy updates for one provider
struct FaultyRepo {
    inner: InMemoryGridRepository,
    fail_id: i64,
}

#[async_trait]
impl GridRepository for FaultyRepo {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.inner.create_user(user).await
    }
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.inner.get_user(id).await
    }
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.get_user_by_username(username).await
    }
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.inner.get_user_by_email(email).await
    }
    async fn create_provider(&self, provider: NewEnergyProvider) -> Result<EnergyProvider> {
        self.inner.create_provider(provider).await
    }
    async fn get_provider(&self, id: i64) -> Result<Option<EnergyProvider>> {
        self.inner.get_provider(id).await
    }
    async fn providers_by_user(&self, user_id: i64) -> Result<Vec<EnergyProvider>> {
        self.inner.providers_by_user(user_id).await
    }
    async fn active_providers(&self) -> Result<Vec<EnergyProvider>> {
        self.inner.active_providers().await
    }
    async fn matchable_providers(&self) -> Result<Vec<EnergyProvider>> {
        self.inner.matchable_providers().await
    }
    async fn update_provider_energy(
        &self,
        id: i64,
        current_production: Quantity,
        available_energy: Quantity,
    ) -> Result<()> {
        if id == self.fail_id {
            return Err(Error::Internal("storage briefly unavailable".to_string()));
        }
        self.inner
            .update_provider_energy(id, current_production, available_energy)
            .await
    }
    async fn debit_available_energy(
        &self,
        id: i64,
        amount: Quantity,
    ) -> Result<Option<EnergyProvider>> {
        self.inner.debit_available_energy(id, amount).await
    }
    async fn create_request(&self, request: NewEnergyRequest) -> Result<EnergyRequest> {
        self.inner.create_request(request).await
    }
    async fn get_request(&self, id: i64) -> Result<Option<EnergyRequest>> {
        self.inner.get_request(id).await
    }
    async fn requests_by_user(&self, user_id: i64) -> Result<Vec<EnergyRequest>> {
        self.inner.requests_by_user(user_id).await
    }
    async fn pending_requests(&self) -> Result<Vec<EnergyRequest>> {
        self.inner.pending_requests().await
    }
    async fn mark_request_matched(&self, id: i64, provider_id: i64) -> Result<EnergyRequest> {
        self.inner.mark_request_matched(id, provider_id).await
    }
    async fn create_transaction(
        &self,
        transaction: NewEnergyTransaction,
    ) -> Result<EnergyTransaction> {
        self.inner.create_transaction(transaction).await
    }
    async fn get_transaction(&self, id: i64) -> Result<Option<EnergyTransaction>> {
        self.inner.get_transaction(id).await
    }
    async fn transactions_by_consumer(&self, user_id: i64) -> Result<Vec<EnergyTransaction>> {
        self.inner.transactions_by_consumer(user_id).await
    }
    async fn recent_transactions(&self, limit: i64) -> Result<Vec<EnergyTransaction>> {
        self.inner.recent_transactions(limit).await
    }
    async fn community_stats(&self) -> Result<Option<CommunityStats>> {
        self.inner.community_stats().await
    }
    async fn upsert_community_stats(&self, stats: CommunityStatsUpdate) -> Result<CommunityStats> {
        self.inner.upsert_community_stats(stats).await
    }
}

#[tokio::test]
async fn one_failing_provider_does_not_abort_the_tick() {
    let inner = InMemoryGridRepository::new();
    let healthy = seed_provider(&inner, "healthy", dec!(5.0), dec!(4.0), dec!(10.0)).await;
    let faulty = seed_provider(&inner, "faulty", dec!(5.0), dec!(4.0), dec!(10.0)).await;

    let repo = Arc::new(FaultyRepo {
        inner,
        fail_id: faulty.id,
    });

    let sim = simulator(repo.clone(), Arc::new(ClientRegistry::new()), 5);
    // The tick as a whole succeeds despite the faulty provider
    sim.tick().await.unwrap();

    let healthy_after = repo.get_provider(healthy.id).await.unwrap().unwrap();
    assert!(healthy_after.last_updated > healthy.last_updated);

    // Stats were still recomputed and written
    assert!(repo.community_stats().await.unwrap().is_some());
}
