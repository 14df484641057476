use crate::config::{AppConfig, SessionConfig};
use crate::db;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        Ok(Self { db, config })
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// In-memory database plus a fixed test configuration.
    pub async fn fake() -> anyhow::Result<Self> {
        let db = db::connect_in_memory().await?;
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            session: SessionConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_secs: 24 * 60 * 60,
                cookie_secure: false,
            },
            static_dir: std::env::temp_dir().join("virtueville-missing-static"),
        });
        Ok(Self { db, config })
    }
}
