//! # Realtime Gateway
//!
//! In-memory map of live websocket clients and the fan-out primitive
//! that copies a shared message to every device of a user. The
//! persistent side of presence lives in [`crate::presence`]; this module
//! only knows about sockets that are open right now, on this process.

use std::{collections::HashMap, time::Instant};

use tokio::sync::{mpsc, RwLock};
use tracing::warn;
use uuid::Uuid;

pub mod ws;

/// A websocket client currently connected to the gateway.
#[derive(Debug)]
pub struct ConnectedClient {
    pub conn_id: String,
    pub user_id: Uuid,
    /// Channel for sending serialized frames to this client's write loop.
    pub sender: mpsc::UnboundedSender<String>,
    pub connected_at: Instant,
}

impl ConnectedClient {
    /// Send a serialized JSON frame to this client.
    pub fn send(&self, frame: &str) -> bool {
        self.sender.send(frame.to_string()).is_ok()
    }
}

/// Live client map, keyed by connection id.
#[derive(Debug, Default)]
pub struct GatewayState {
    clients: RwLock<HashMap<String, ConnectedClient>>,
}

impl GatewayState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client connection.
    pub async fn register_client(&self, client: ConnectedClient) {
        let conn_id = client.conn_id.clone();
        self.clients.write().await.insert(conn_id, client);
    }

    /// Remove a client by conn_id. Returns the removed client if found.
    pub async fn remove_client(&self, conn_id: &str) -> Option<ConnectedClient> {
        self.clients.write().await.remove(conn_id)
    }

    /// Whether a connection id is backed by an open socket.
    pub async fn is_connection_active(&self, conn_id: &str) -> bool {
        self.clients.read().await.contains_key(conn_id)
    }

    /// Number of connected clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Delivers a frame to each target connection, fire-and-forget.
    ///
    /// A closed or missing target is logged and skipped; it never aborts
    /// delivery to the rest. Returns the number of successful sends.
    pub async fn fan_out(&self, targets: &[String], frame: &str) -> usize {
        let clients = self.clients.read().await;
        let mut delivered = 0;

        for conn_id in targets {
            match clients.get(conn_id) {
                Some(client) if client.send(frame) => delivered += 1,
                Some(client) => {
                    warn!(conn_id = %client.conn_id, "Frame dropped: write loop gone");
                }
                None => {
                    warn!(conn_id = %conn_id, "Frame dropped: connection not registered");
                }
            }
        }

        delivered
    }
}
