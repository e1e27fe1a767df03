//! Session room management for pub/sub
//!
//! Manages per-session "rooms" for broadcasting events to every connection
//! currently viewing a session.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::connection::Connection;
use super::events::ServerEvent;

/// Manages session rooms for broadcasting events
pub struct RoomManager {
    /// Map of session_id -> list of connections
    rooms: RwLock<HashMap<Uuid, Vec<Arc<Connection>>>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection to a session room
    pub async fn join(&self, session_id: Uuid, conn: Arc<Connection>) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(session_id).or_default();
        // Rejoining must not duplicate the member
        members.retain(|c| c.conn_id != conn.conn_id);
        members.push(Arc::clone(&conn));

        tracing::debug!(
            session_id = %session_id,
            conn_id = %conn.conn_id,
            room_size = members.len(),
            "Connection joined session room"
        );
    }

    /// Broadcast an event to all connections in a session room
    ///
    /// Silently ignores send errors (closed connections will be cleaned up)
    pub async fn broadcast(&self, session_id: &Uuid, event: ServerEvent) {
        let rooms = self.rooms.read().await;
        if let Some(members) = rooms.get(session_id) {
            let mut failed = 0;
            for conn in members {
                if conn.send(event.clone()).is_err() {
                    failed += 1;
                }
            }

            tracing::debug!(
                session_id = %session_id,
                recipients = members.len() - failed,
                failed,
                "Broadcast event to session room"
            );
        }
    }

    /// Remove a connection from all rooms
    pub async fn remove_connection(&self, conn_id: &Uuid) {
        let mut rooms = self.rooms.write().await;
        for members in rooms.values_mut() {
            members.retain(|c| c.conn_id != *conn_id);
        }
        // Clean up empty rooms
        rooms.retain(|_, members| !members.is_empty());
    }

    /// Number of connections currently viewing a session
    pub async fn room_size(&self, session_id: &Uuid) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(session_id).map(|v| v.len()).unwrap_or(0)
    }

    /// Total number of active rooms
    pub async fn room_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
