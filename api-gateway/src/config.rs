//! Application configuration

use std::env;
use std::time::Duration;

/// Application configuration
pub struct AppConfig {
    /// API port
    pub port: u16,
    /// Database URL; in-memory storage is used when unset
    pub database_url: Option<String>,
    /// Heartbeat probe period for WebSocket connections
    pub heartbeat_interval: Duration,
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL").ok(),
            heartbeat_interval: env::var("WS_HEARTBEAT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(30)),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
