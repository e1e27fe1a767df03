//! Common types used across Atrium

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Users
// =============================================================================

/// Platform role. Admin and support users form the support class; everyone
/// else is client class for chat routing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Support,
    Manager,
    Client,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn is_support_class(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Support)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// Chat sessions
// =============================================================================

/// Lifecycle status of a chat session. Assignment is represented by the
/// presence of `support_id` while status remains active; there is no
/// transition back from closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "chat_session_status", rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Closed,
}

/// One client's support conversation, optionally bound to a project and
/// optionally claimed by a support agent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatSession {
    pub id: Uuid,
    pub client_id: Uuid,
    pub support_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub status: SessionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ChatSession {
    /// Session visibility: its client, its assigned agent, and admins.
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.client_id == user_id || self.support_id == Some(user_id)
    }
}

/// Partial update applied through the generic session-update path.
/// `last_activity` is bumped on every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPatch {
    pub support_id: Option<Uuid>,
    pub status: Option<SessionStatus>,
}

// =============================================================================
// Chat messages
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
