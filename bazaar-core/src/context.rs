use std::sync::Arc;
use crate::config::Config;
use crate::db::{close_pool, create_pool as create_db_pool, run_migrations, DbPool};

/// Process-wide handles, built once at startup and passed to every component.
#[derive(Clone)]
pub struct MarketContext {
    pub config: Arc<Config>,
    pub db_pool: Arc<DbPool>,
}

impl MarketContext {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = create_db_pool(&config.database).await?;

        if config.database.run_migrations {
            run_migrations(&db_pool).await?;
        }

        Ok(MarketContext {
            config: Arc::new(config),
            db_pool,
        })
    }

    pub fn shutdown(&self) {
        close_pool(&self.db_pool);
    }
}
