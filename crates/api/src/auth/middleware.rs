//! Authentication middleware
//!
//! Validates the `Authorization: Bearer` header on protected routes and
//! attaches the resolved [`AuthUser`] as a request extension.

use std::sync::Arc;

use atrium_shared::UserRole;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::jwt::JwtManager;
use crate::error::ApiError;

/// Shared state for auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub jwt_manager: Arc<JwtManager>,
}

/// The authenticated principal attached to requests that pass `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
    pub email: String,
}

impl AuthUser {
    pub fn is_support_class(&self) -> bool {
        self.role.is_support_class()
    }
}

/// Require a valid bearer token; rejects with 401 otherwise.
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = auth.jwt_manager.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        role: claims.role,
        email: claims.email,
    });

    Ok(next.run(req).await)
}
