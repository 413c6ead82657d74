//! # Websocket Connection Handling
//!
//! Upgrade endpoint and per-connection lifecycle: authenticate, register
//! with the gateway, reconcile presence, then pump frames until the
//! socket drops.
//!
//! Wire frames are JSON `{event, data}`. Clients send `message`; the
//! server sends `message` (fan-out) and `exception` (auth failure).

use std::time::Instant;

use ::auth::{extract_bearer_token, validate_access_token};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap},
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    gateway::ConnectedClient,
    AppState,
};

/// A gateway wire frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    pub data:  String,
}

impl Frame {
    #[must_use]
    pub fn message(data: &str) -> Self {
        Self {
            event: "message".to_string(),
            data:  data.to_string(),
        }
    }

    #[must_use]
    pub fn exception(message: &str) -> Self {
        Self {
            event: "exception".to_string(),
            data:  message.to_string(),
        }
    }

    /// Serialized form; the frame shape cannot fail to serialize.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"event\":\"exception\"}".to_string())
    }
}

/// Query parameters accepted by the upgrade endpoint.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Access token alternative to the Authorization header.
    pub token: Option<String>,
}

/// `GET /ws` upgrade handler.
pub async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    let token = bearer_or_query_token(&headers, query);
    ws.on_upgrade(move |socket| handle_connection(socket, state, token))
}

fn bearer_or_query_token(headers: &HeaderMap, query: WsQuery) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .or(query.token)
}

/// Drives one websocket from upgrade to close.
async fn handle_connection(mut socket: WebSocket, state: AppState, token: Option<String>) {
    // Authenticate before anything is registered.
    let user_id = match authenticate(&state, token.as_deref()) {
        Some(user_id) => user_id,
        None => {
            let _ = socket
                .send(Message::Text(
                    Frame::exception("Authentication error").to_json().into(),
                ))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    let conn_id = Uuid::new_v4().to_string();

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    // Write loop: frames queued by fan-out go out here.
    let writer = tokio::spawn(async move {
        while let Some(frame) = receiver.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Register with the gateway before persisting presence: the moment
    // another device can see this conn_id, it must be deliverable.
    state
        .gateway
        .register_client(ConnectedClient {
            conn_id: conn_id.clone(),
            user_id,
            sender,
            connected_at: Instant::now(),
        })
        .await;

    // Pruning stale ids and recording this connection happen in one
    // locked presence write, so a device connecting concurrently cannot
    // be erased by our prune or vice versa.
    if let Err(e) = state
        .presence
        .prune_and_add(user_id, &state.gateway, &conn_id)
        .await
    {
        warn!(user_id = %user_id, error = %e, "Presence add failed");
        state.gateway.remove_client(&conn_id).await;
        writer.abort();
        return;
    }
    info!(user_id = %user_id, conn_id = %conn_id, "Client connected");

    while let Some(Ok(message)) = ws_receiver.next().await {
        match message {
            Message::Text(text) => {
                if let Err(e) = handle_frame(&state, user_id, &conn_id, text.as_str()).await {
                    warn!(conn_id = %conn_id, error = %e, "Inbound frame failed");
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Drop exactly our own registration; other devices stay untouched.
    state.gateway.remove_client(&conn_id).await;
    if let Err(e) = state.presence.remove(user_id, &conn_id).await {
        warn!(conn_id = %conn_id, error = %e, "Presence remove failed");
    }
    writer.abort();
    info!(user_id = %user_id, conn_id = %conn_id, "Client disconnected");
}

fn authenticate(state: &AppState, token: Option<&str>) -> Option<Uuid> {
    let claims = validate_access_token(&state.jwt_config, token?).ok()?;
    Uuid::parse_str(&claims.sub).ok()
}

/// Handles one inbound frame from connection `conn_id` of `user_id`.
async fn handle_frame(
    state: &AppState,
    user_id: Uuid,
    conn_id: &str,
    raw: &str,
) -> error::Result<()> {
    let Ok(frame) = serde_json::from_str::<Frame>(raw) else {
        debug!(conn_id = %conn_id, "Ignoring malformed frame");
        return Ok(());
    };

    if frame.event != "message" {
        debug!(conn_id = %conn_id, event = %frame.event, "Ignoring unknown event");
        return Ok(());
    }

    // Delivery set is the stored presence plus the sender itself, so the
    // sending device always sees its own message echoed back.
    let mut targets = state.presence.list(user_id).await?;
    if !targets.iter().any(|t| t == conn_id) {
        targets.push(conn_id.to_string());
    }

    state.presence.set_last_message(user_id, &frame.data).await?;

    let delivered = state
        .gateway
        .fan_out(&targets, &Frame::message(&frame.data).to_json())
        .await;
    debug!(user_id = %user_id, delivered, targets = targets.len(), "Message fanned out");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip() {
        let frame = Frame::message("clipboard text");
        let json = frame.to_json();
        let parsed: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event, "message");
        assert_eq!(parsed.data, "clipboard text");
    }

    #[test]
    fn test_exception_frame_shape() {
        let json = Frame::exception("Authentication error").to_json();
        assert!(json.contains("\"event\":\"exception\""));
        assert!(json.contains("Authentication error"));
    }

    #[test]
    fn test_bearer_header_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
        let token = bearer_or_query_token(
            &headers,
            WsQuery {
                token: Some("from-query".to_string()),
            },
        );
        assert_eq!(token.as_deref(), Some("from-header"));

        let token = bearer_or_query_token(
            &HeaderMap::new(),
            WsQuery {
                token: Some("from-query".to_string()),
            },
        );
        assert_eq!(token.as_deref(), Some("from-query"));
    }
}
