//! Error types for Atrium

use thiserror::Error;

/// Failures surfaced by the chat core and its collaborators.
///
/// Every failure is handled locally by the handler that triggered it and
/// surfaced as a best-effort error to the originating connection; nothing
/// here escalates to crash the process.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ChatError::NotFound("row not found".to_string()),
            other => ChatError::Persistence(other.to_string()),
        }
    }
}
