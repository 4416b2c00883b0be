//! Connection fan-out registry
//!
//! Owns the set of live client connections and broadcasts events to all
//! of them. Delivery is best-effort, at-most-once per connected client
//! per broadcast; a connection that cannot be written to is dropped from
//! the set. Liveness is tracked with a ping/pong heartbeat: a client that
//! failed to answer the previous probe is closed and removed on the next
//! sweep.
//!
//! The registry is transport-agnostic: each client is a sender of
//! [`OutboundFrame`]s, and the WebSocket handler adapts frames to wire
//! messages and feeds pong/auth/close signals back in.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::events::GridEvent;

/// Identifier of a registered connection
pub type ClientId = Uuid;

/// Frame handed to a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// A serialized event envelope to deliver as a text message
    Event(String),
    /// Heartbeat probe
    Ping,
    /// The registry is done with this connection
    Close,
}

/// Per-connection state
struct ClientHandle {
    sender: mpsc::UnboundedSender<OutboundFrame>,
    user_id: Option<i64>,
    is_alive: bool,
}

/// Registry of live client connections
#[derive(Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, ClientHandle>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Register a new connection. New connections start out live.
    pub fn register(&self, sender: mpsc::UnboundedSender<OutboundFrame>) -> ClientId {
        let id = Uuid::new_v4();
        self.clients.insert(
            id,
            ClientHandle {
                sender,
                user_id: None,
                is_alive: true,
            },
        );
        info!("WebSocket client registered: {}", id);
        id
    }

    /// Remove a connection from the broadcast set
    pub fn unregister(&self, id: ClientId) {
        if self.clients.remove(&id).is_some() {
            info!("WebSocket client unregistered: {}", id);
        }
    }

    /// Bind an authenticated identity from the client handshake
    pub fn authenticate(&self, id: ClientId, user_id: i64) {
        if let Some(mut client) = self.clients.get_mut(&id) {
            client.user_id = Some(user_id);
            debug!("Client {} authenticated as user {}", id, user_id);
        }
    }

    /// Record a heartbeat answer
    pub fn mark_alive(&self, id: ClientId) {
        if let Some(mut client) = self.clients.get_mut(&id) {
            client.is_alive = true;
        }
    }

    /// Identity bound to a connection, if it has authenticated
    pub fn user_of(&self, id: ClientId) -> Option<i64> {
        self.clients.get(&id).and_then(|c| c.user_id)
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Broadcast an event to every connected client.
    ///
    /// The envelope is serialized once; clients whose channel is gone are
    /// removed from the set.
    pub fn broadcast(&self, event: &GridEvent) {
        let message = match serde_json::to_string(event) {
            Ok(message) => message,
            Err(e) => {
                error!("Failed to serialize event: {}", e);
                return;
            }
        };

        self.clients.retain(|id, client| {
            let delivered = client
                .sender
                .send(OutboundFrame::Event(message.clone()))
                .is_ok();
            if !delivered {
                debug!("Dropping disconnected client {}", id);
            }
            delivered
        });
    }

    /// Heartbeat sweep: drop clients that missed the previous probe, then
    /// probe the rest.
    pub fn sweep(&self) {
        self.clients.retain(|id, client| {
            if !client.is_alive {
                debug!("Closing unresponsive client {}", id);
                let _ = client.sender.send(OutboundFrame::Close);
                return false;
            }
            client.is_alive = false;
            client.sender.send(OutboundFrame::Ping).is_ok()
        });
    }

    /// Close every connection, used at server teardown
    pub fn close_all(&self) {
        self.clients.retain(|_, client| {
            let _ = client.sender.send(OutboundFrame::Close);
            false
        });
    }
}

/// Spawn the recurring heartbeat sweep for a registry
pub fn spawn_heartbeat(registry: Arc<ClientRegistry>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            registry.sweep();
        }
    })
}
