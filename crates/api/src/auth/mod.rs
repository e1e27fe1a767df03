//! Authentication module for Atrium
//!
//! Token issuance lives with the excluded login layer; this module owns
//! validation: the JWT manager and the request middleware that gates the
//! protected routes.

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtError, JwtManager};
pub use middleware::{require_auth, AuthState, AuthUser};
