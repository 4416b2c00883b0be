//! Per-provider write serialization
//!
//! A provider's energy fields are written by both the matching engine and
//! the simulation loop. Every writer must hold the provider's lock across
//! its read-modify-write so `available_energy` never goes negative.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per provider id
#[derive(Default)]
pub struct ProviderLockRegistry {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl ProviderLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for a provider, creating it on first use
    pub async fn acquire(&self, provider_id: i64) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(provider_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
