//! API routes

pub mod chat;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth::require_auth, chat::ws_handler, state::AppState};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Protected API routes (auth required) - under /api/v1
    let protected_api_routes = Router::new()
        // Chat session routes
        .route(
            "/chat/sessions",
            get(chat::list_sessions).post(chat::create_session),
        )
        .route("/chat/sessions/:session_id", get(chat::get_session))
        .route(
            "/chat/sessions/:session_id/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .route("/chat/unread-count", get(chat::unread_count))
        // Support-side assignment (role check inside handler)
        .route(
            "/admin/chat/sessions/:session_id/assign",
            post(chat::assign_session),
        )
        .layer(middleware::from_fn_with_state(auth_state, require_auth));

    // WebSocket routes (auth handled in handler via query parameter)
    let websocket_routes = Router::new().route("/ws/chat", get(ws_handler));

    let api_v1_routes = Router::new()
        .merge(protected_api_routes)
        .merge(websocket_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", api_v1_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .with_state(state)
}
