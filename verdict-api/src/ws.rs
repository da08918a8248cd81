//! WebSocket Event Broadcasting
//!
//! Real-time event streaming for dashboard clients. The frontend polls REST
//! endpoints for lists and uses this channel for push-style updates (typing
//! indicators, comment creation, lifecycle transitions).
//!
//! ## Architecture
//!
//! - Uses tokio broadcast channel for event distribution
//! - Optional per-entity subscriptions: clients that connect with
//!   `?entity_type=issue&entity_id=<uuid>` only receive events for that
//!   entity; unscoped clients receive everything
//! - JSON-serialized events using the WsEvent enum

use crate::error::ApiResult;
use crate::events::WsEvent;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use verdict_core::{EntityId, EntityKind};

/// WebSocket state shared across the application.
///
/// This state is injected into Axum route handlers and into the services
/// that broadcast lifecycle events.
#[derive(Clone)]
pub struct WsState {
    /// Broadcast channel for sending events to all connected clients.
    /// Each client subscribes to this channel and filters events by its
    /// entity scope.
    tx: broadcast::Sender<WsEvent>,
}

impl WsState {
    /// Create a new WebSocket state with the specified channel capacity.
    ///
    /// The capacity determines how many events can be buffered before
    /// slow consumers start dropping messages.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event to all connected clients.
    ///
    /// This is a non-blocking operation. If no clients are connected,
    /// the event is simply dropped. If a client's buffer is full, that
    /// client will miss the event (lagged).
    pub fn broadcast(&self, event: WsEvent) {
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(receiver_count) => {
                debug!(
                    event_type = event_type,
                    receivers = receiver_count,
                    "Broadcast event"
                );
            }
            Err(_) => {
                // No receivers connected - this is fine
                debug!(event_type = event_type, "No receivers for event");
            }
        }
    }

    /// Subscribe to the event stream.
    ///
    /// Returns a receiver that will receive all future events.
    /// The receiver must be polled to avoid lagging.
    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.tx.subscribe()
    }
}

/// Entity scope a WebSocket client subscribes to.
///
/// Both fields must be given together for a scoped subscription; a partial
/// scope is treated as unscoped.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WsQuery {
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<EntityId>,
}

impl WsQuery {
    fn scope(&self) -> Option<(EntityKind, EntityId)> {
        match (self.entity_type, self.entity_id) {
            (Some(kind), Some(id)) => Some((kind, id)),
            _ => None,
        }
    }
}

/// WebSocket upgrade handler.
///
/// ## Protocol
///
/// 1. Client connects, optionally with `entity_type`/`entity_id` query params
/// 2. Connection upgraded to WebSocket
/// 3. Server sends Connected event echoing the subscribed scope
/// 4. Server streams events filtered by scope
/// 5. Client can send ping frames to keep the connection alive
/// 6. On disconnect, server sends Disconnected event
///
/// ## Example
///
/// ```text
/// GET /api/v1/ws?entity_type=issue&entity_id=<uuid>
/// Upgrade: websocket
/// ```
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState>>,
    Query(query): Query<WsQuery>,
) -> ApiResult<Response> {
    let scope = query.scope();
    info!(?scope, "WebSocket connection request");

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, scope)))
}

/// Handle an individual WebSocket connection.
///
/// This function runs for the lifetime of the WebSocket connection.
/// It subscribes to the broadcast channel and forwards scope-matching
/// events to the client.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>, scope: Option<(EntityKind, EntityId)>) {
    info!(?scope, "WebSocket connected");

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to the broadcast channel
    let mut rx = state.subscribe();

    // Send initial Connected event
    let connected_event = WsEvent::Connected {
        entity_type: scope.map(|(kind, _)| kind),
        entity_id: scope.map(|(_, id)| id),
    };
    if let Err(e) = send_event(&mut sender, connected_event).await {
        error!(?scope, error = %e, "Failed to send Connected event");
        return;
    }

    // Spawn a task to handle incoming messages from the client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_)) => {
                    // Pong is automatically sent by axum
                    debug!("Received ping");
                }
                Ok(Message::Pong(_)) => {
                    debug!("Received pong");
                }
                Ok(Message::Text(text)) => {
                    debug!(text = %text, "Received text message (ignored)");
                }
                Ok(Message::Binary(data)) => {
                    debug!(len = data.len(), "Received binary message (ignored)");
                }
                Err(e) => {
                    warn!(error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    // Main loop: forward events to the client
    loop {
        tokio::select! {
            // Receive event from broadcast channel
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if should_send_event(&event, scope) {
                            if let Err(e) = send_event(&mut sender, event).await {
                                error!(
                                    ?scope,
                                    error = %e,
                                    "Failed to send event, closing connection"
                                );
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(?scope, skipped = skipped, "Client lagged, some events were dropped");
                        // Send error event to notify client
                        let error_event = WsEvent::Error {
                            message: format!("Lagged: {} events dropped", skipped),
                        };
                        if let Err(e) = send_event(&mut sender, error_event).await {
                            error!(?scope, error = %e, "Failed to send error event");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(?scope, "Broadcast channel closed");
                        break;
                    }
                }
            }

            // Check if receiver task finished (client disconnected)
            _ = &mut recv_task => {
                debug!(?scope, "Receiver task finished");
                break;
            }
        }
    }

    // Send Disconnected event before closing
    let disconnected_event = WsEvent::Disconnected {
        reason: "Connection closed".to_string(),
    };
    let _ = send_event(&mut sender, disconnected_event).await;

    info!(?scope, "WebSocket disconnected");
}

/// Send an event to the WebSocket client.
///
/// Serializes the event to JSON and sends it as a text message.
async fn send_event(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    event: WsEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(&event).map_err(|e| {
        error!(error = %e, "Failed to serialize event");
        axum::Error::new(e)
    })?;

    sender.send(Message::Text(json)).await
}

/// Determine if an event should be sent to a client based on its scope.
///
/// Connection events (Connected, Disconnected, Error) are always sent.
/// Unscoped clients receive everything; scoped clients only receive events
/// for their (entity_type, entity_id) pair.
fn should_send_event(event: &WsEvent, client_scope: Option<(EntityKind, EntityId)>) -> bool {
    if event.is_connection_event() {
        return true;
    }

    let Some(scope) = client_scope else {
        return true;
    };

    event.entity_scope() == Some(scope)
}
