//! Chat connection management
//!
//! Represents an active, authenticated WebSocket connection with its
//! session subscriptions.

use std::collections::HashSet;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use atrium_shared::{User, UserRole};

use super::events::ServerEvent;

/// Represents an active chat connection
#[derive(Debug)]
pub struct Connection {
    /// Unique ID for this connection
    pub conn_id: Uuid,

    /// Authenticated user ID
    pub user_id: Uuid,

    /// Display name resolved during the handshake
    pub display_name: String,

    /// Platform role at connection time; decides the registry this
    /// connection lives in
    pub role: UserRole,

    /// Channel to send events to this connection
    pub sender: mpsc::UnboundedSender<ServerEvent>,

    /// Set of session IDs this connection is subscribed to
    subscriptions: RwLock<HashSet<Uuid>>,
}

impl Connection {
    pub fn new(user: &User, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            user_id: user.id,
            display_name: user.name.clone(),
            role: user.role,
            sender,
            subscriptions: RwLock::new(HashSet::new()),
        }
    }

    pub fn is_support_class(&self) -> bool {
        self.role.is_support_class()
    }

    /// Send an event to this connection
    ///
    /// Returns Ok(()) if sent successfully, Err if connection is closed
    #[allow(clippy::result_large_err)] // Error type is from tokio mpsc, containing the failed event
    pub fn send(&self, event: ServerEvent) -> Result<(), mpsc::error::SendError<ServerEvent>> {
        self.sender.send(event)
    }

    /// Subscribe to a session's broadcast group
    pub async fn subscribe(&self, session_id: Uuid) {
        let mut subs = self.subscriptions.write().await;
        subs.insert(session_id);
        tracing::debug!(
            conn_id = %self.conn_id,
            session_id = %session_id,
            "Subscribed to session"
        );
    }

    /// Check if subscribed to a session
    pub async fn is_subscribed(&self, session_id: &Uuid) -> bool {
        let subs = self.subscriptions.read().await;
        subs.contains(session_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_connection_subscription() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = Connection::new(&user(UserRole::Client), tx);
        let session_id = Uuid::new_v4();

        assert!(!conn.is_subscribed(&session_id).await);

        conn.subscribe(session_id).await;
        assert!(conn.is_subscribed(&session_id).await);
    }

    #[tokio::test]
    async fn test_connection_classification() {
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(Connection::new(&user(UserRole::Admin), tx.clone()).is_support_class());
        assert!(Connection::new(&user(UserRole::Support), tx.clone()).is_support_class());
        assert!(!Connection::new(&user(UserRole::Client), tx).is_support_class());
    }
}
