//! Realtime core for the energy sharing platform
//!
//! Holds the typed event vocabulary broadcast to clients, the connection
//! fan-out registry with its heartbeat sweep, and the production
//! simulation loop that recomputes community statistics.

pub mod events;
pub mod fanout;
pub mod simulation;

pub use events::{EnergyDataUpdatePayload, EnergyUpdatePayload, GridEvent, MatchFoundPayload};
pub use fanout::{spawn_heartbeat, ClientId, ClientRegistry, OutboundFrame};
pub use simulation::{SimulationConfig, Simulator};
