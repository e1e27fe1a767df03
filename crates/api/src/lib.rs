//! Atrium API Library
//!
//! This crate contains the API server components for Atrium: configuration,
//! authentication, the HTTP routes, and the real-time chat gateway.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
