//! Chat event types and serialization
//!
//! Defines all client-to-server and server-to-client event types with
//! type-safe serde serialization.

use atrium_shared::{ChatMessage, ChatSession};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join a chat session's broadcast group
    JoinSession { session_id: Uuid },

    /// Send a message within a session
    SendMessage {
        session_id: Uuid,
        content: String,
        receiver_id: Option<Uuid>,
    },

    /// Mark all messages addressed to the caller in a session as read
    MarkRead { session_id: Uuid },

    /// Open (or rejoin) the caller's support session
    RequestSupport { project_id: Option<Uuid> },
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Current active sessions (sent to support-class users on connect)
    ActiveSessions { sessions: Vec<ChatSession> },

    /// The caller's unread message count across all sessions
    UnreadCount { count: i64 },

    /// The caller's own sessions (sent to client-class users on connect)
    ClientSessions { sessions: Vec<ChatSession> },

    /// Full message history of a session, sent to a joining connection
    ChatHistory {
        session_id: Uuid,
        messages: Vec<ChatMessage>,
    },

    /// A message broadcast to every member of the session's group
    NewMessage { message: ChatMessage },

    /// Out-of-band nudge for a receiver not currently viewing the session
    Notification {
        kind: String,
        session_id: Uuid,
        message: String,
    },

    /// Acknowledges the caller joined (or rejoined) a session
    SessionJoined { session: ChatSession },

    /// A new unassigned session, fanned out to connected support users
    NewSession { session: ChatSession },

    /// Tells the session's client an agent claimed the session
    SupportJoined { session_id: Uuid, support_id: Uuid },

    /// Tells the assigning agent about the updated session record
    SessionAssigned { session: ChatSession },

    /// Error message
    Error { message: String },
}
