//! Real-time support chat
//!
//! Bridges transport-level WebSocket connections and the user/chat
//! persistence collaborators:
//! - **Connection**: one authenticated socket with its subscription set
//! - **Registry**: who is online, split into support-class and client-class
//! - **Rooms**: per-session broadcast groups for message fan-out
//! - **Store**: the persistence seam (Postgres in production)
//! - **Gateway**: event routing and the session lifecycle
//! - **Handler**: the axum WebSocket route
//!
//! Registries and rooms are process-local; a restart drops them and clients
//! reconnect and rejoin explicitly. There is no cross-instance coordination.

pub mod connection;
pub mod events;
pub mod gateway;
pub mod handler;
pub mod registry;
pub mod rooms;
pub mod store;

pub use gateway::ChatGateway;
pub use handler::ws_handler;
pub use store::{ChatStore, PgChatStore};
