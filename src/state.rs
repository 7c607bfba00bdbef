use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{DbPool, OrmConn, orm_from_pool};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let orm = orm_from_pool(pool.clone());
        Self {
            pool,
            orm,
            config: Arc::new(config),
        }
    }
}
