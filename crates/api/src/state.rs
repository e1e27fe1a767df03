//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AuthState, JwtManager};
use crate::chat::{ChatGateway, PgChatStore};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub auth: AuthState,
    pub chat: ChatGateway,
}

impl AppState {
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        let jwt_manager = Arc::new(JwtManager::new(
            &config.jwt_secret,
            config.jwt_expiry_hours,
        ));
        let auth = AuthState { jwt_manager };
        let chat = ChatGateway::new(Arc::new(PgChatStore::new(pool.clone())));

        Self {
            pool,
            config,
            auth,
            chat,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.clone()
    }
}
