//! Persistence seam for the chat gateway
//!
//! The gateway talks to user lookup and chat persistence through
//! [`ChatStore`]; production wires in [`PgChatStore`], tests use the
//! in-memory store below.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use atrium_shared::{ChatError, ChatMessage, ChatSession, SessionPatch, User};

pub type StoreResult<T> = Result<T, ChatError>;

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn create_session(
        &self,
        client_id: Uuid,
        project_id: Option<Uuid>,
    ) -> StoreResult<ChatSession>;

    async fn session_by_id(&self, id: Uuid) -> StoreResult<Option<ChatSession>>;

    async fn sessions_by_client(&self, client_id: Uuid) -> StoreResult<Vec<ChatSession>>;

    async fn active_sessions(&self) -> StoreResult<Vec<ChatSession>>;

    async fn update_session(&self, id: Uuid, patch: SessionPatch) -> StoreResult<ChatSession>;

    async fn create_message(
        &self,
        session_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> StoreResult<ChatMessage>;

    /// Messages in chronological order
    async fn messages_by_session(&self, id: Uuid) -> StoreResult<Vec<ChatMessage>>;

    async fn mark_messages_read(&self, session_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    async fn unread_count(&self, user_id: Uuid) -> StoreResult<i64>;
}

// =============================================================================
// Postgres implementation
// =============================================================================

pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_session(
        &self,
        client_id: Uuid,
        project_id: Option<Uuid>,
    ) -> StoreResult<ChatSession> {
        let session = sqlx::query_as::<_, ChatSession>(
            r#"
            INSERT INTO chat_sessions (client_id, project_id)
            VALUES ($1, $2)
            RETURNING id, client_id, support_id, project_id, status, last_activity, created_at
            "#,
        )
        .bind(client_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn session_by_id(&self, id: Uuid) -> StoreResult<Option<ChatSession>> {
        let session = sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT id, client_id, support_id, project_id, status, last_activity, created_at
            FROM chat_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn sessions_by_client(&self, client_id: Uuid) -> StoreResult<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT id, client_id, support_id, project_id, status, last_activity, created_at
            FROM chat_sessions
            WHERE client_id = $1
            ORDER BY last_activity DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn active_sessions(&self) -> StoreResult<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT id, client_id, support_id, project_id, status, last_activity, created_at
            FROM chat_sessions
            WHERE status = 'active'
            ORDER BY last_activity DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn update_session(&self, id: Uuid, patch: SessionPatch) -> StoreResult<ChatSession> {
        let session = sqlx::query_as::<_, ChatSession>(
            r#"
            UPDATE chat_sessions
            SET support_id = COALESCE($2, support_id),
                status = COALESCE($3, status),
                last_activity = NOW()
            WHERE id = $1
            RETURNING id, client_id, support_id, project_id, status, last_activity, created_at
            "#,
        )
        .bind(id)
        .bind(patch.support_id)
        .bind(patch.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ChatError::NotFound(format!("chat session {id}")))?;

        Ok(session)
    }

    async fn create_message(
        &self,
        session_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> StoreResult<ChatMessage> {
        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (session_id, sender_id, receiver_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, session_id, sender_id, receiver_id, content, is_read, created_at
            "#,
        )
        .bind(session_id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        // Every message bumps the session's activity timestamp
        sqlx::query("UPDATE chat_sessions SET last_activity = NOW() WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(message)
    }

    async fn messages_by_session(&self, id: Uuid) -> StoreResult<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, session_id, sender_id, receiver_id, content, is_read, created_at
            FROM chat_messages
            WHERE session_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn mark_messages_read(&self, session_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE chat_messages
            SET is_read = TRUE
            WHERE session_id = $1 AND receiver_id = $2 AND NOT is_read
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unread_count(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM chat_messages WHERE receiver_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// In-memory implementation for tests
// =============================================================================
