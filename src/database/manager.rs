use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgStore;
use crate::database::store::{CalculationStore, StoreError, UserStore};

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Schema setup failed: {0}")]
    Migration(#[from] StoreError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The stores the service runs on. Both handles may point at the same backend.
#[derive(Clone)]
pub struct Stores {
    pub calculations: Arc<dyn CalculationStore>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            calculations: store.clone(),
            users: store,
        }
    }
}

/// Opens the configured backend
pub struct DatabaseManager;

impl DatabaseManager {
    /// PostgreSQL when `database.url` is set, otherwise an in-memory store.
    pub async fn open(config: &DatabaseConfig) -> Result<Stores, DatabaseError> {
        let Some(url) = config.url.as_deref() else {
            info!("DATABASE_URL not set, using in-memory store");
            return Ok(Stores::in_memory());
        };

        let pool = Self::connect(url, config).await?;
        let store = Arc::new(PgStore::new(pool));
        store.migrate().await?;

        Ok(Stores {
            calculations: store.clone(),
            users: store,
        })
    }

    async fn connect(url: &str, config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let redacted_url = Self::redacted(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", redacted_url);
        Ok(pool)
    }

    /// Connection string with the password masked, for logs.
    fn redacted(url: &str) -> Result<String, DatabaseError> {
        let mut parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if parsed.password().is_some() {
            parsed
                .set_password(Some("****"))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(parsed.into())
    }
}
