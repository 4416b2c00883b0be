//! Matching engine for the energy sharing platform
//!
//! Binds pending energy requests to the provider best able to supply
//! them, records the resulting transaction, and notifies connected
//! clients.

pub mod engine;

pub use engine::{MatchDetails, MatchOutcome, MatchingEngine, DEFAULT_PRICE_PER_KWH};
