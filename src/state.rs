use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::services::chat::ChatClient;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub chat: ChatClient,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: AppConfig, chat: ChatClient) -> Self {
        Self {
            db_pool,
            config: Arc::new(config),
            chat,
        }
    }
}
