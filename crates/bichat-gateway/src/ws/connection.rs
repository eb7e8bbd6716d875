use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use bichat_core::config::MAX_WS_FRAME_BYTES;
use bichat_core::types::{ConversationId, Role};
use bichat_protocol::{ConnectParams, InboundEvent};

use crate::app::AppState;

const HEARTBEAT_INTERVAL_SECS: u64 = 25;

/// Axum handler — upgrades HTTP to WebSocket at GET /ws?cid=...&role=....
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, params, state))
}

/// Per-connection task — lives for the entire WS session lifetime.
async fn handle_connection(socket: WebSocket, params: ConnectParams, state: Arc<AppState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let cid = ConversationId::from(params.cid);
    let role: Role = match params.role.parse() {
        Ok(r) => r,
        Err(e) => {
            warn!(conn_id, error = %e, "rejecting connection with invalid role");
            return;
        }
    };

    info!(conn_id, cid = %cid, %role, "new WS connection");

    let (mut tx, mut rx) = socket.split();
    let mut broadcast_rx = state.broker.join(&cid, role);
    state.ws_clients.insert(conn_id.clone(), ());
    state.coordinator.on_connect(&cid, role).await;

    let mut tick_interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            msg = rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > MAX_WS_FRAME_BYTES {
                            warn!(conn_id, size = text.len(), "oversized frame, dropping frame");
                        } else {
                            dispatch(&cid, role, &text, &state).await;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(conn_id, error = %e, "websocket read error");
                        break;
                    }
                    _ => {}
                }
            }

            event = broadcast_rx.recv() => {
                match event {
                    Ok(payload) => {
                        if tx.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(conn_id, skipped, "connection lagged behind broadcast, dropping frames");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }

            _ = tick_interval.tick() => {
                if tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.ws_clients.remove(&conn_id);
    if role == Role::Agent {
        state.coordinator.on_agent_set_online(&cid, false).await;
    }
    info!(conn_id, "WS connection closed");
}

/// Parse one inbound text frame and dispatch it to the coordinator, enforcing
/// that a connection can only act in the role it connected as.
async fn dispatch(cid: &ConversationId, role: Role, text: &str, state: &Arc<AppState>) {
    let event: InboundEvent = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            warn!(cid = %cid, error = %e, "malformed inbound frame, ignoring");
            return;
        }
    };

    match (role, event) {
        (Role::Client, InboundEvent::ClientMessage { message, image }) => {
            state.coordinator.on_client_message(cid, message, image).await;
        }
        (Role::Agent, InboundEvent::AgentMessage { message, image, target_lang }) => {
            state.coordinator.on_agent_message(cid, message, image, target_lang).await;
        }
        (Role::Agent, InboundEvent::AgentTyping) => {
            state.coordinator.on_agent_typing(cid).await;
        }
        (Role::Agent, InboundEvent::AgentSetStatus { online }) => {
            state.coordinator.on_agent_set_online(cid, online).await;
        }
        (other_role, _) => {
            warn!(cid = %cid, role = %other_role, "dropping frame not valid for this role");
        }
    }
}
