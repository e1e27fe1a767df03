//! Chat gateway
//!
//! Routes events between live connections and the persistence collaborators.
//! One gateway instance per server process owns the connection registries and
//! the session rooms; every handler borrows it by reference.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use atrium_shared::{ChatError, ChatMessage, ChatSession, SessionPatch, SessionStatus, User};

use super::connection::Connection;
use super::events::{ClientEvent, ServerEvent};
use super::registry::ConnectionRegistry;
use super::rooms::RoomManager;
use super::store::ChatStore;

const MAX_MESSAGE_LENGTH: usize = 10_000;

#[derive(Clone)]
pub struct ChatGateway {
    registry: Arc<ConnectionRegistry>,
    rooms: Arc<RoomManager>,
    store: Arc<dyn ChatStore>,
}

impl ChatGateway {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            rooms: Arc::new(RoomManager::new()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// Register an authenticated connection and push its on-connect snapshot:
    /// support-class users see the active sessions, client-class users their
    /// unread count and their own sessions.
    pub async fn register(
        &self,
        user: &User,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Arc<Connection> {
        let conn = Arc::new(Connection::new(user, sender));
        self.registry.insert(Arc::clone(&conn)).await;

        if conn.is_support_class() {
            match self.store.active_sessions().await {
                Ok(sessions) => {
                    let _ = conn.send(ServerEvent::ActiveSessions { sessions });
                }
                Err(e) => {
                    tracing::error!(error = %e, user_id = %conn.user_id, "Failed to load active sessions");
                    let _ = conn.send(ServerEvent::Error {
                        message: "Failed to load active sessions".to_string(),
                    });
                }
            }
        } else {
            match self.store.unread_count(conn.user_id).await {
                Ok(count) => {
                    let _ = conn.send(ServerEvent::UnreadCount { count });
                }
                Err(e) => {
                    tracing::error!(error = %e, user_id = %conn.user_id, "Failed to load unread count");
                }
            }
            match self.store.sessions_by_client(conn.user_id).await {
                Ok(sessions) => {
                    let _ = conn.send(ServerEvent::ClientSessions { sessions });
                }
                Err(e) => {
                    tracing::error!(error = %e, user_id = %conn.user_id, "Failed to load client sessions");
                }
            }
        }

        conn
    }

    /// Drop the user from both registries and every room. Idempotent; the
    /// stale-socket race on reconnect is the accepted cost of last-write-wins
    /// registration.
    pub async fn disconnect(&self, conn: &Connection) {
        self.registry.remove(&conn.user_id).await;
        self.rooms.remove_connection(&conn.conn_id).await;
        tracing::info!(
            conn_id = %conn.conn_id,
            user_id = %conn.user_id,
            "Chat connection closed"
        );
    }

    /// Dispatch one inbound event from an authenticated connection
    pub async fn handle_event(&self, conn: &Arc<Connection>, event: ClientEvent) {
        match event {
            ClientEvent::JoinSession { session_id } => self.join_session(conn, session_id).await,
            ClientEvent::SendMessage {
                session_id,
                content,
                receiver_id,
            } => self.send_message(conn, session_id, content, receiver_id).await,
            ClientEvent::MarkRead { session_id } => self.mark_read(conn, session_id).await,
            ClientEvent::RequestSupport { project_id } => {
                self.request_support(conn, project_id).await
            }
        }
    }

    async fn join_session(&self, conn: &Arc<Connection>, session_id: Uuid) {
        let session = match self.store.session_by_id(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                let _ = conn.send(ServerEvent::Error {
                    message: "Chat session not found".to_string(),
                });
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, session_id = %session_id, "Failed to load chat session");
                let _ = conn.send(ServerEvent::Error {
                    message: "Failed to load chat session".to_string(),
                });
                return;
            }
        };

        // Visible to the session's client, its assigned agent, and admins
        if !session.is_participant(conn.user_id) && !conn.role.is_admin() {
            let _ = conn.send(ServerEvent::Error {
                message: "You do not have access to this chat session".to_string(),
            });
            return;
        }

        conn.subscribe(session_id).await;
        self.rooms.join(session_id, Arc::clone(conn)).await;

        if let Err(e) = self.store.mark_messages_read(session_id, conn.user_id).await {
            tracing::warn!(error = %e, session_id = %session_id, "Failed to mark messages read on join");
        }

        match self.store.messages_by_session(session_id).await {
            Ok(messages) => {
                let _ = conn.send(ServerEvent::SessionJoined { session });
                let _ = conn.send(ServerEvent::ChatHistory {
                    session_id,
                    messages,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, session_id = %session_id, "Failed to load chat history");
                let _ = conn.send(ServerEvent::Error {
                    message: "Failed to load chat history".to_string(),
                });
            }
        }
    }

    async fn send_message(
        &self,
        conn: &Arc<Connection>,
        session_id: Uuid,
        content: String,
        receiver_id: Option<Uuid>,
    ) {
        let session = match self.store.session_by_id(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                let _ = conn.send(ServerEvent::Error {
                    message: "Chat session not found".to_string(),
                });
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, session_id = %session_id, "Failed to load chat session");
                let _ = conn.send(ServerEvent::Error {
                    message: "Failed to load chat session".to_string(),
                });
                return;
            }
        };

        if let Err(e) = self
            .post_message(&session, conn.user_id, &content, receiver_id)
            .await
        {
            tracing::warn!(error = %e, session_id = %session_id, sender_id = %conn.user_id, "Message rejected");
            let _ = conn.send(ServerEvent::Error {
                message: e.to_string(),
            });
        }
    }

    /// Validate, persist, and fan out one message. Shared by the socket and
    /// HTTP send paths. The message is dropped on failure, never queued.
    pub async fn post_message(
        &self,
        session: &ChatSession,
        sender_id: Uuid,
        content: &str,
        receiver_id: Option<Uuid>,
    ) -> Result<ChatMessage, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation(
                "Message content cannot be empty".to_string(),
            ));
        }
        if content.len() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::Validation(format!(
                "Message too long (max {MAX_MESSAGE_LENGTH} characters)"
            )));
        }

        // The receiver is the other participant unless given explicitly: a
        // client sends to the assigned agent, anyone else to the client.
        let receiver_id = match receiver_id {
            Some(id) => id,
            None if sender_id == session.client_id => session.support_id.ok_or_else(|| {
                ChatError::Validation("No support agent assigned to this session".to_string())
            })?,
            None => session.client_id,
        };

        let message = self
            .store
            .create_message(session.id, sender_id, receiver_id, content)
            .await?;

        self.deliver(message.clone()).await;

        Ok(message)
    }

    /// Broadcast to the session room; a receiver who is online but not
    /// viewing the session gets an out-of-band nudge instead. An offline
    /// receiver gets nothing.
    async fn deliver(&self, message: ChatMessage) {
        let session_id = message.session_id;
        let receiver_id = message.receiver_id;

        self.rooms
            .broadcast(&session_id, ServerEvent::NewMessage { message })
            .await;

        if let Some(receiver) = self.registry.any(&receiver_id).await {
            if !receiver.is_subscribed(&session_id).await {
                let _ = receiver.send(ServerEvent::Notification {
                    kind: "new-message".to_string(),
                    session_id,
                    message: "You have a new message".to_string(),
                });
                match self.store.unread_count(receiver_id).await {
                    Ok(count) => {
                        let _ = receiver.send(ServerEvent::UnreadCount { count });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, user_id = %receiver_id, "Failed to refresh unread count");
                    }
                }
            }
        }
    }

    async fn mark_read(&self, conn: &Arc<Connection>, session_id: Uuid) {
        if let Err(e) = self.store.mark_messages_read(session_id, conn.user_id).await {
            tracing::error!(error = %e, session_id = %session_id, "Failed to mark messages read");
            let _ = conn.send(ServerEvent::Error {
                message: "Failed to mark messages read".to_string(),
            });
            return;
        }

        match self.store.unread_count(conn.user_id).await {
            Ok(count) => {
                let _ = conn.send(ServerEvent::UnreadCount { count });
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %conn.user_id, "Failed to refresh unread count");
            }
        }
    }

    async fn request_support(&self, conn: &Arc<Connection>, project_id: Option<Uuid>) {
        if conn.is_support_class() {
            let _ = conn.send(ServerEvent::Error {
                message: "Only clients can request support".to_string(),
            });
            return;
        }

        match self.open_session(conn.user_id, project_id).await {
            Ok((session, created)) => {
                conn.subscribe(session.id).await;
                self.rooms.join(session.id, Arc::clone(conn)).await;
                tracing::info!(
                    session_id = %session.id,
                    client_id = %conn.user_id,
                    created,
                    "Client entered support session"
                );
                let _ = conn.send(ServerEvent::SessionJoined { session });
            }
            Err(e) => {
                tracing::error!(error = %e, client_id = %conn.user_id, "Failed to open support session");
                let _ = conn.send(ServerEvent::Error {
                    message: "Failed to open support session".to_string(),
                });
            }
        }
    }

    /// Rejoin the client's existing active session, or create a new
    /// unassigned one and notify every connected support user. At most one
    /// active session per client.
    pub async fn open_session(
        &self,
        client_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<(ChatSession, bool), ChatError> {
        let existing = self
            .store
            .sessions_by_client(client_id)
            .await?
            .into_iter()
            .find(|s| s.status == SessionStatus::Active);

        if let Some(session) = existing {
            return Ok((session, false));
        }

        let session = self.store.create_session(client_id, project_id).await?;

        for agent in self.registry.support_connections().await {
            let _ = agent.send(ServerEvent::NewSession {
                session: session.clone(),
            });
        }

        Ok((session, true))
    }

    /// Claim a session for a support agent. Only active sessions can be
    /// (re)assigned; callers get a bare success flag and no further detail.
    pub async fn assign_support(&self, session_id: Uuid, support_id: Uuid) -> bool {
        let session = match self.store.session_by_id(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::warn!(session_id = %session_id, "Assign failed: session not found");
                return false;
            }
            Err(e) => {
                tracing::error!(error = %e, session_id = %session_id, "Assign failed: session lookup");
                return false;
            }
        };

        if session.status != SessionStatus::Active {
            tracing::warn!(session_id = %session_id, "Assign failed: session is not active");
            return false;
        }

        let updated = match self
            .store
            .update_session(
                session_id,
                SessionPatch {
                    support_id: Some(support_id),
                    status: None,
                },
            )
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(error = %e, session_id = %session_id, "Assign failed: update");
                return false;
            }
        };

        if let Some(client) = self.registry.client(&session.client_id).await {
            let _ = client.send(ServerEvent::SupportJoined {
                session_id,
                support_id,
            });
        }

        if let Some(agent) = self.registry.support(&support_id).await {
            agent.subscribe(session_id).await;
            self.rooms.join(session_id, Arc::clone(&agent)).await;
            let _ = agent.send(ServerEvent::SessionAssigned { session: updated });
        }

        tracing::info!(
            session_id = %session_id,
            support_id = %support_id,
            "Support agent assigned to session"
        );

        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::chat::store::memory::MemoryChatStore;
    use atrium_shared::UserRole;
    use time::OffsetDateTime;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            role,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    async fn setup() -> (ChatGateway, Arc<MemoryChatStore>) {
        let store = Arc::new(MemoryChatStore::new());
        let gateway = ChatGateway::new(Arc::clone(&store) as Arc<dyn ChatStore>);
        (gateway, store)
    }

    async fn connect(
        gateway: &ChatGateway,
        user: &User,
    ) -> (Arc<Connection>, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = gateway.register(user, tx).await;
        (conn, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) {
        while rx.try_recv().is_ok() {}
    }

    /// Opens a session for `client` over the socket path and returns it
    async fn open_session_for(
        gateway: &ChatGateway,
        conn: &Arc<Connection>,
        rx: &mut UnboundedReceiver<ServerEvent>,
    ) -> ChatSession {
        gateway
            .handle_event(conn, ClientEvent::RequestSupport { project_id: None })
            .await;
        loop {
            match rx.try_recv().expect("expected session-joined event") {
                ServerEvent::SessionJoined { session } => return session,
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_assign_sets_support_and_rejects_closed() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let agent = user(UserRole::Support);
        store.add_user(client.clone()).await;
        store.add_user(agent.clone()).await;

        let (conn, mut rx) = connect(&gateway, &client).await;
        drain(&mut rx);
        let session = open_session_for(&gateway, &conn, &mut rx).await;
        assert!(session.support_id.is_none());

        assert!(gateway.assign_support(session.id, agent.id).await);
        let updated = store.session_by_id(session.id).await.unwrap().unwrap();
        assert_eq!(updated.support_id, Some(agent.id));

        // A closed session cannot be (re)assigned
        store.close_session(session.id).await;
        assert!(!gateway.assign_support(session.id, agent.id).await);
    }

    #[tokio::test]
    async fn test_request_support_reuses_active_session() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        store.add_user(client.clone()).await;

        let (conn, mut rx) = connect(&gateway, &client).await;
        drain(&mut rx);

        let first = open_session_for(&gateway, &conn, &mut rx).await;
        let second = open_session_for(&gateway, &conn, &mut rx).await;

        assert_eq!(first.id, second.id);
        assert_eq!(store.sessions_by_client(client.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_message_round_trip_in_order() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let agent = user(UserRole::Support);
        store.add_user(client.clone()).await;
        store.add_user(agent.clone()).await;

        let (conn, mut rx) = connect(&gateway, &client).await;
        drain(&mut rx);
        let session = open_session_for(&gateway, &conn, &mut rx).await;
        gateway.assign_support(session.id, agent.id).await;

        for content in ["first", "second", "third"] {
            gateway
                .handle_event(
                    &conn,
                    ClientEvent::SendMessage {
                        session_id: session.id,
                        content: content.to_string(),
                        receiver_id: None,
                    },
                )
                .await;
        }

        let messages = store.messages_by_session(session.id).await.unwrap();
        assert_eq!(messages.len(), 3);
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert!(messages.iter().all(|m| m.receiver_id == agent.id));
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let agent = user(UserRole::Support);
        store.add_user(client.clone()).await;
        store.add_user(agent.clone()).await;

        let (client_conn, mut client_rx) = connect(&gateway, &client).await;
        drain(&mut client_rx);
        let session = open_session_for(&gateway, &client_conn, &mut client_rx).await;
        gateway.assign_support(session.id, agent.id).await;

        // Agent sends two messages addressed to the client
        let (agent_conn, mut agent_rx) = connect(&gateway, &agent).await;
        drain(&mut agent_rx);
        for content in ["hello", "are you there?"] {
            gateway
                .handle_event(
                    &agent_conn,
                    ClientEvent::SendMessage {
                        session_id: session.id,
                        content: content.to_string(),
                        receiver_id: None,
                    },
                )
                .await;
        }
        assert_eq!(store.unread_count(client.id).await.unwrap(), 2);

        drain(&mut client_rx);
        for _ in 0..2 {
            gateway
                .handle_event(
                    &client_conn,
                    ClientEvent::MarkRead {
                        session_id: session.id,
                    },
                )
                .await;
            match client_rx.try_recv().unwrap() {
                ServerEvent::UnreadCount { count } => assert_eq!(count, 0),
                other => panic!("expected unread-count, got {other:?}"),
            }
        }

        let messages = store.messages_by_session(session.id).await.unwrap();
        assert!(messages.iter().all(|m| m.is_read));
    }

    #[tokio::test]
    async fn test_join_rejects_non_participants() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let stranger = user(UserRole::Client);
        store.add_user(client.clone()).await;
        store.add_user(stranger.clone()).await;

        let (client_conn, mut client_rx) = connect(&gateway, &client).await;
        drain(&mut client_rx);
        let session = open_session_for(&gateway, &client_conn, &mut client_rx).await;

        let (stranger_conn, mut stranger_rx) = connect(&gateway, &stranger).await;
        drain(&mut stranger_rx);
        gateway
            .handle_event(
                &stranger_conn,
                ClientEvent::JoinSession {
                    session_id: session.id,
                },
            )
            .await;

        match stranger_rx.try_recv().unwrap() {
            ServerEvent::Error { .. } => {}
            other => panic!("expected permission error, got {other:?}"),
        }
        assert!(stranger_rx.try_recv().is_err(), "history must not be sent");
        assert!(!stranger_conn.is_subscribed(&session.id).await);
    }

    #[tokio::test]
    async fn test_admin_may_join_any_session() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let admin = user(UserRole::Admin);
        store.add_user(client.clone()).await;
        store.add_user(admin.clone()).await;

        let (client_conn, mut client_rx) = connect(&gateway, &client).await;
        drain(&mut client_rx);
        let session = open_session_for(&gateway, &client_conn, &mut client_rx).await;

        let (admin_conn, mut admin_rx) = connect(&gateway, &admin).await;
        drain(&mut admin_rx);
        gateway
            .handle_event(
                &admin_conn,
                ClientEvent::JoinSession {
                    session_id: session.id,
                },
            )
            .await;

        match admin_rx.try_recv().unwrap() {
            ServerEvent::SessionJoined { session: joined } => assert_eq!(joined.id, session.id),
            other => panic!("expected session-joined, got {other:?}"),
        }
        match admin_rx.try_recv().unwrap() {
            ServerEvent::ChatHistory { session_id, .. } => assert_eq!(session_id, session.id),
            other => panic!("expected chat-history, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_new_session_fans_out_to_connected_support() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let agent_a = user(UserRole::Support);
        let agent_b = user(UserRole::Admin);
        store.add_user(client.clone()).await;
        store.add_user(agent_a.clone()).await;
        store.add_user(agent_b.clone()).await;

        let (_a_conn, mut a_rx) = connect(&gateway, &agent_a).await;
        let (_b_conn, mut b_rx) = connect(&gateway, &agent_b).await;
        drain(&mut a_rx);
        drain(&mut b_rx);

        let (client_conn, mut client_rx) = connect(&gateway, &client).await;
        drain(&mut client_rx);
        let session = open_session_for(&gateway, &client_conn, &mut client_rx).await;
        assert!(session.support_id.is_none());
        assert_eq!(session.status, SessionStatus::Active);

        for rx in [&mut a_rx, &mut b_rx] {
            match rx.try_recv().unwrap() {
                ServerEvent::NewSession { session: announced } => {
                    assert_eq!(announced.id, session.id);
                }
                other => panic!("expected new-session, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_assign_notifies_client_and_subscribes_agent() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let agent = user(UserRole::Support);
        store.add_user(client.clone()).await;
        store.add_user(agent.clone()).await;

        let (client_conn, mut client_rx) = connect(&gateway, &client).await;
        drain(&mut client_rx);
        let session = open_session_for(&gateway, &client_conn, &mut client_rx).await;

        let (agent_conn, mut agent_rx) = connect(&gateway, &agent).await;
        drain(&mut agent_rx);

        assert!(gateway.assign_support(session.id, agent.id).await);

        match client_rx.try_recv().unwrap() {
            ServerEvent::SupportJoined {
                session_id,
                support_id,
            } => {
                assert_eq!(session_id, session.id);
                assert_eq!(support_id, agent.id);
            }
            other => panic!("expected support-joined, got {other:?}"),
        }

        match agent_rx.try_recv().unwrap() {
            ServerEvent::SessionAssigned { session: assigned } => {
                assert_eq!(assigned.support_id, Some(agent.id));
            }
            other => panic!("expected session-assigned, got {other:?}"),
        }
        assert!(agent_conn.is_subscribed(&session.id).await);
        assert_eq!(gateway.rooms().room_size(&session.id).await, 2);
    }

    #[tokio::test]
    async fn test_unsubscribed_receiver_gets_notification_not_message() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let agent = user(UserRole::Support);
        store.add_user(client.clone()).await;
        store.add_user(agent.clone()).await;

        let (client_conn, mut client_rx) = connect(&gateway, &client).await;
        drain(&mut client_rx);
        let session = open_session_for(&gateway, &client_conn, &mut client_rx).await;

        // Assign while the agent is offline, then connect the agent without
        // joining the session's room
        assert!(gateway.assign_support(session.id, agent.id).await);
        drain(&mut client_rx);
        let (_agent_conn, mut agent_rx) = connect(&gateway, &agent).await;
        drain(&mut agent_rx);

        gateway
            .handle_event(
                &client_conn,
                ClientEvent::SendMessage {
                    session_id: session.id,
                    content: "hello".to_string(),
                    receiver_id: None,
                },
            )
            .await;

        match agent_rx.try_recv().unwrap() {
            ServerEvent::Notification {
                kind, session_id, ..
            } => {
                assert_eq!(kind, "new-message");
                assert_eq!(session_id, session.id);
            }
            other => panic!("expected notification, got {other:?}"),
        }
        match agent_rx.try_recv().unwrap() {
            ServerEvent::UnreadCount { count } => assert_eq!(count, 1),
            other => panic!("expected unread-count, got {other:?}"),
        }
        assert!(agent_rx.try_recv().is_err());

        // The sender's own room membership still receives the broadcast
        match client_rx.try_recv().unwrap() {
            ServerEvent::NewMessage { message } => assert_eq!(message.content, "hello"),
            other => panic!("expected new-message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_to_missing_session_skips_persistence() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        store.add_user(client.clone()).await;

        let (conn, mut rx) = connect(&gateway, &client).await;
        drain(&mut rx);

        gateway
            .handle_event(
                &conn,
                ClientEvent::SendMessage {
                    session_id: Uuid::new_v4(),
                    content: "hello?".to_string(),
                    receiver_id: None,
                },
            )
            .await;

        match rx.try_recv().unwrap() {
            ServerEvent::Error { .. } => {}
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(store.message_write_count(), 0);
    }

    #[tokio::test]
    async fn test_client_send_requires_assigned_agent() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        store.add_user(client.clone()).await;

        let (conn, mut rx) = connect(&gateway, &client).await;
        drain(&mut rx);
        let session = open_session_for(&gateway, &conn, &mut rx).await;

        gateway
            .handle_event(
                &conn,
                ClientEvent::SendMessage {
                    session_id: session.id,
                    content: "anyone there?".to_string(),
                    receiver_id: None,
                },
            )
            .await;

        match rx.try_recv().unwrap() {
            ServerEvent::Error { message } => {
                assert!(message.contains("No support agent"));
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(store.message_write_count(), 0);
    }

    #[tokio::test]
    async fn test_explicit_receiver_wins() {
        let (gateway, store) = setup().await;
        let client = user(UserRole::Client);
        let admin = user(UserRole::Admin);
        store.add_user(client.clone()).await;
        store.add_user(admin.clone()).await;

        let (conn, mut rx) = connect(&gateway, &client).await;
        drain(&mut rx);
        let session = open_session_for(&gateway, &conn, &mut rx).await;

        gateway
            .handle_event(
                &conn,
                ClientEvent::SendMessage {
                    session_id: session.id,
                    content: "for the admin".to_string(),
                    receiver_id: Some(admin.id),
                },
            )
            .await;

        let messages = store.messages_by_session(session.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].receiver_id, admin.id);
    }

    #[tokio::test]
    async fn test_support_cannot_request_support() {
        let (gateway, store) = setup().await;
        let agent = user(UserRole::Support);
        store.add_user(agent.clone()).await;

        let (conn, mut rx) = connect(&gateway, &agent).await;
        drain(&mut rx);
        gateway
            .handle_event(&conn, ClientEvent::RequestSupport { project_id: None })
            .await;

        match rx.try_recv().unwrap() {
            ServerEvent::Error { message } => assert!(message.contains("Only clients")),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
