//! WebSocket handler for the chat gateway
//!
//! Authenticates the upgrade request, then pumps events between the socket
//! and the gateway.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use serde::Deserialize;

use crate::state::AppState;

use super::events::{ClientEvent, ServerEvent};
use super::gateway::ChatGateway;
use atrium_shared::User;

#[derive(Debug, Deserialize)]
pub struct ChatSocketQuery {
    token: String,
}

/// WebSocket handler - upgrades the HTTP connection to a chat socket.
/// Authenticates via query parameter token instead of middleware Extension.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<ChatSocketQuery>,
) -> Result<Response, StatusCode> {
    let claims = state
        .auth
        .jwt_manager
        .validate_access_token(&params.token)
        .map_err(|e| {
            tracing::warn!(error = %e, "Chat socket auth failed: invalid token");
            StatusCode::UNAUTHORIZED
        })?;

    // The connection is rejected before any registry mutation when the user
    // lookup fails
    let user = match state.chat.store().get_user(claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(user_id = %claims.sub, "Chat socket auth failed: user not found");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            tracing::error!(error = %e, "Chat socket auth: user lookup failed");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    tracing::info!(user_id = %user.id, "Chat socket upgrade requested");

    let gateway = state.chat.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user, gateway)))
}

/// Handle one chat socket for its whole lifetime
async fn handle_socket(socket: WebSocket, user: User, gateway: ChatGateway) {
    let (mut sink, mut stream) = socket.split();

    // Channel the gateway uses to push events to this connection
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ServerEvent>();
    let conn = gateway.register(&user, tx).await;

    // Outbound pump
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sink.send(Message::Text(json)).await.is_err() {
                        break; // Connection closed
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize chat event");
                }
            }
        }
    });

    // Inbound events
    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    gateway.handle_event(&conn, event).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse chat event");
                    let _ = conn.send(ServerEvent::Error {
                        message: "Invalid event format".to_string(),
                    });
                }
            },
            Message::Close(_) => break,
            // Axum answers pings automatically
            _ => {}
        }
    }

    gateway.disconnect(&conn).await;
    send_task.abort();
}
