use crate::config::{AppConfig, StoreBackend};
use crate::users::{MemoryUserStore, PgUserStore, UserStore};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    /// Set only for the postgres backend; used for migrations.
    pub db: Option<PgPool>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let db = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
                Ok(Self {
                    users,
                    config,
                    db: Some(db),
                })
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory user store; accounts are lost on restart");
                Ok(Self::from_parts(Arc::new(MemoryUserStore::new()), config))
            }
        }
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self {
            users,
            config,
            db: None,
        }
    }

    /// Fresh in-memory state for tests.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryUserStore::new()),
            Arc::new(AppConfig::memory()),
        )
    }
}
