//! Chat HTTP routes
//!
//! Thin surface over the chat gateway for the dashboard views that are not
//! socket-driven. Each handler re-derives the participant-or-admin check
//! before touching persistence.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atrium_shared::{ChatMessage, ChatSession};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SessionsListResponse {
    pub sessions: Vec<ChatSession>,
}

#[derive(Debug, Serialize)]
pub struct MessagesListResponse {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub receiver_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct AssignSessionRequest {
    /// Defaults to the caller (an agent claiming the session for themselves)
    pub support_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AssignSessionResponse {
    pub success: bool,
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Load a session and enforce its visibility: the client, the assigned
/// agent, and admins.
async fn load_session_for(state: &AppState, auth: &AuthUser, id: Uuid) -> ApiResult<ChatSession> {
    let session = state
        .chat
        .store()
        .session_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if !session.is_participant(auth.user_id) && !auth.role.is_admin() {
        return Err(ApiError::Forbidden);
    }

    Ok(session)
}

// =============================================================================
// Handlers
// =============================================================================

/// Open (or rejoin) the caller's support session
pub async fn create_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<Json<ChatSession>> {
    if auth.is_support_class() {
        return Err(ApiError::Forbidden);
    }

    let (session, created) = state
        .chat
        .open_session(auth.user_id, req.project_id)
        .await?;

    tracing::info!(
        session_id = %session.id,
        client_id = %auth.user_id,
        created,
        "Support session opened via HTTP"
    );

    Ok(Json(session))
}

/// List sessions: support-class users see the active sessions, clients see
/// their own
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<SessionsListResponse>> {
    let sessions = if auth.is_support_class() {
        state.chat.store().active_sessions().await?
    } else {
        state.chat.store().sessions_by_client(auth.user_id).await?
    };

    Ok(Json(SessionsListResponse { sessions }))
}

/// Get a single session
pub async fn get_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ChatSession>> {
    let session = load_session_for(&state, &auth, session_id).await?;
    Ok(Json(session))
}

/// List a session's messages in chronological order
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<MessagesListResponse>> {
    load_session_for(&state, &auth, session_id).await?;

    let messages = state.chat.store().messages_by_session(session_id).await?;
    Ok(Json(MessagesListResponse { messages }))
}

/// Send a message into a session. Follows the same receiver-resolution and
/// fan-out rules as the socket path.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<ChatMessage>> {
    let session = load_session_for(&state, &auth, session_id).await?;

    let message = state
        .chat
        .post_message(&session, auth.user_id, &req.content, req.receiver_id)
        .await?;

    Ok(Json(message))
}

/// The caller's unread message count across all sessions
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let count = state.chat.store().unread_count(auth.user_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Assign a support agent to a session. Agents claim sessions for
/// themselves; only admins may assign someone else.
pub async fn assign_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AssignSessionRequest>,
) -> ApiResult<Json<AssignSessionResponse>> {
    if !auth.is_support_class() {
        return Err(ApiError::Forbidden);
    }

    let support_id = req.support_id.unwrap_or(auth.user_id);
    if support_id != auth.user_id && !auth.role.is_admin() {
        return Err(ApiError::Forbidden);
    }

    // Assignee must be an existing support-class user
    let assignee = state
        .chat
        .store()
        .get_user(support_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Assignee user not found".to_string()))?;
    if !assignee.role.is_support_class() {
        return Err(ApiError::BadRequest(
            "Assignee must be an admin or support member".to_string(),
        ));
    }

    let success = state.chat.assign_support(session_id, support_id).await;

    tracing::info!(
        session_id = %session_id,
        support_id = %support_id,
        assigned_by = %auth.user_id,
        success,
        "Session assignment requested"
    );

    Ok(Json(AssignSessionResponse { success }))
}
