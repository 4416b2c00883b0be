//! WebSocket endpoint

pub mod handler;
pub mod message;
