//! Online-user registries
//!
//! Two process-local maps from user id to live connection: one for
//! support-class users (admin/support), one for client-class users. A user
//! appears in at most one registry at a time, decided by their role at
//! connection time; a reconnect replaces the prior entry (last connection
//! wins, no multi-device fan-out).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::connection::Connection;

#[derive(Default)]
pub struct ConnectionRegistry {
    support: RwLock<HashMap<Uuid, Arc<Connection>>>,
    clients: RwLock<HashMap<Uuid, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under its user id, replacing any prior entry.
    /// Returns the replaced connection, if any.
    pub async fn insert(&self, conn: Arc<Connection>) -> Option<Arc<Connection>> {
        let map = if conn.is_support_class() {
            &self.support
        } else {
            &self.clients
        };

        let mut map = map.write().await;
        let replaced = map.insert(conn.user_id, Arc::clone(&conn));

        tracing::info!(
            conn_id = %conn.conn_id,
            user_id = %conn.user_id,
            support_class = conn.is_support_class(),
            replaced = replaced.is_some(),
            "Chat connection registered"
        );

        replaced
    }

    /// Remove the user's entry from both registries. Idempotent; harmless
    /// if absent.
    pub async fn remove(&self, user_id: &Uuid) {
        self.support.write().await.remove(user_id);
        self.clients.write().await.remove(user_id);
    }

    /// Look up a support-class user's live connection
    pub async fn support(&self, user_id: &Uuid) -> Option<Arc<Connection>> {
        self.support.read().await.get(user_id).cloned()
    }

    /// Look up a client-class user's live connection
    pub async fn client(&self, user_id: &Uuid) -> Option<Arc<Connection>> {
        self.clients.read().await.get(user_id).cloned()
    }

    /// Look up a live connection in either registry
    pub async fn any(&self, user_id: &Uuid) -> Option<Arc<Connection>> {
        match self.support(user_id).await {
            Some(conn) => Some(conn),
            None => self.client(user_id).await,
        }
    }

    /// All currently connected support-class users
    pub async fn support_connections(&self) -> Vec<Arc<Connection>> {
        self.support.read().await.values().cloned().collect()
    }

    pub async fn support_count(&self) -> usize {
        self.support.read().await.len()
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}
