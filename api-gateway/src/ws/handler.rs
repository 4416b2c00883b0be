//! WebSocket handler implementation
//!
//! Adapts a WebSocket connection to the client registry: outbound frames
//! from the registry are forwarded to the socket by a dedicated sender
//! task, while the receive loop feeds pongs and the auth handshake back
//! into the registry. When either side ends, the connection is removed
//! from the broadcast set.

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};
use energy_data::OutboundFrame;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info};

use crate::ws::message::ClientMessage;
use crate::AppState;

/// Handle WebSocket upgrade
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: axum::extract::ws::WebSocket, state: Arc<AppState>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let client_id = state.registry.register(tx);

    info!("New WebSocket connection: {}", client_id);

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward frames from the registry to the socket
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let message = match frame {
                OutboundFrame::Event(text) => axum::extract::ws::Message::Text(text),
                OutboundFrame::Ping => axum::extract::ws::Message::Ping(Vec::new()),
                OutboundFrame::Close => break,
            };
            if let Err(e) = ws_sender.send(message).await {
                error!("Error sending message: {}", e);
                break;
            }
        }

        // The registry is done with this connection, or sending failed
        let _ = ws_sender.close().await;
    });

    // Handle incoming messages
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(axum::extract::ws::Message::Text(text)) => {
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Auth { user_id }) => {
                        state.registry.authenticate(client_id, user_id);
                    }
                    Err(e) => {
                        debug!("Ignoring malformed client message: {}", e);
                    }
                }
            }
            Ok(axum::extract::ws::Message::Pong(_)) => {
                state.registry.mark_alive(client_id);
            }
            Ok(axum::extract::ws::Message::Close(_)) => {
                debug!("Received close message");
                break;
            }
            Err(e) => {
                error!("Error receiving message: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Connection closed, clean up
    info!("WebSocket connection closed: {}", client_id);
    state.registry.unregister(client_id);
    send_task.abort();
}
