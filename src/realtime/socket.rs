//! WebSocket transport for the operator event channel.
//!
//! Wire contract:
//!
//! - inbound `{"type":"register","operator_id":…}` binds the session
//! - inbound `{"type":"notify","target_operator_id":…?,"payload":…}` is
//!   forwarded to the router
//! - outbound `{"type":"notification","payload":…}`
//!
//! The operator identity on `register` is verified upstream by the
//! authentication collaborator; this layer trusts it. Reconnection is the
//! client re-issuing `register` on a fresh socket — registration simply
//! supersedes the old binding.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::hub::{OutboundNotification, SessionHub};
use super::registry::{ConnectionRegistry, SessionId};
use super::router::{NotificationEvent, NotificationRouter};

/// Shared handles for every connection handler.
#[derive(Clone)]
pub struct RealtimeState {
    pub registry: Arc<ConnectionRegistry>,
    pub hub: Arc<SessionHub>,
    pub router: Arc<NotificationRouter>,
}

impl RealtimeState {
    pub fn new() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let hub = Arc::new(SessionHub::new());
        let router = Arc::new(NotificationRouter::new(registry.clone(), hub.clone()));
        Self {
            registry,
            hub,
            router,
        }
    }
}

impl Default for RealtimeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages accepted from a connected client.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Register {
        operator_id: Uuid,
    },
    Notify {
        #[serde(default)]
        target_operator_id: Option<Uuid>,
        payload: Value,
    },
}

/// Messages pushed to a connected client.
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Notification { payload: Value },
}

/// Mount the event channel under `/ws`.
pub fn routes(state: RealtimeState) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<RealtimeState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: RealtimeState) {
    let session = SessionId::new();
    let outbound_rx = state.hub.attach(session);
    debug!(session = %session, "Transport connected");

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(write_outbound(sink, outbound_rx));

    read_inbound(stream, session, &state).await;

    // Cleanup runs on every exit path out of the read loop: close frame,
    // transport error, or client vanishing mid-task.
    state.hub.detach(session);
    if let Some(operator_id) = state.registry.unregister(session) {
        info!(operator_id = %operator_id, session = %session, "Operator session unregistered");
    }
    writer.abort();
    debug!(session = %session, "Transport disconnected");
}

async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundNotification>,
) {
    while let Some(outbound) = outbound_rx.recv().await {
        let message = ServerMessage::Notification {
            payload: outbound.payload,
        };
        match serde_json::to_string(&message) {
            Ok(text) => {
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(error = %err, "Outbound notification failed to encode");
            }
        }
    }
}

async fn read_inbound(mut stream: SplitStream<WebSocket>, session: SessionId, state: &RealtimeState) {
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                debug!(session = %session, error = %err, "Transport read error");
                break;
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Ping/pong are answered by the axum layer.
            _ => continue,
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(client_message) => handle_client_message(client_message, session, state),
            Err(err) => {
                warn!(session = %session, error = %err, "Unparseable client message ignored");
            }
        }
    }
}

fn handle_client_message(message: ClientMessage, session: SessionId, state: &RealtimeState) {
    match message {
        ClientMessage::Register { operator_id } => {
            if let Some(superseded) = state.registry.register(operator_id, session) {
                debug!(
                    operator_id = %operator_id,
                    superseded = %superseded,
                    "Prior session superseded"
                );
            }
            info!(operator_id = %operator_id, session = %session, "Operator session registered");
        }
        ClientMessage::Notify {
            target_operator_id,
            payload,
        } => {
            let event = NotificationEvent {
                target: target_operator_id,
                payload,
            };
            let outcome = state.router.deliver(event);
            debug!(session = %session, outcome = ?outcome, "Notify forwarded");
        }
    }
}
