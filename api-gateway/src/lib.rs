// api-gateway/src/lib.rs
pub mod api;
pub mod config;
pub mod error;
pub mod ws;

use std::sync::Arc;

use energy_data::ClientRegistry;
use grid_storage::{GridService, ProviderLockRegistry};
use matching_engine::MatchingEngine;

/// App state shared across handlers
pub struct AppState {
    /// Storage service
    pub storage: Arc<GridService>,
    /// Matching engine
    pub matching_engine: Arc<MatchingEngine>,
    /// Connected client registry
    pub registry: Arc<ClientRegistry>,
    /// Per-provider write locks
    pub locks: Arc<ProviderLockRegistry>,
}
