use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, middleware::session::SessionKeys};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub sessions: SessionKeys,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            orm,
            sessions: SessionKeys::new(&config.session_secret, config.session_ttl_hours),
        }
    }
}
