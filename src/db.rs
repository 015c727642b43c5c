use std::sync::Arc;

use sqlx::MySqlPool;
use tracing::info;

use crate::config::Config;
use crate::store::{MemoryStore, MySqlStore, Store};

/// Builds the attendance store: MySQL when DATABASE_URL is configured, the
/// in-process memory store otherwise (fine for a single instance; the unique
/// (employee, date) guarantee holds either way).
pub async fn init_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            let pool = MySqlPool::connect(url).await?;
            let store = MySqlStore::new(pool);
            store.ensure_schema().await?;
            info!("attendance store: mysql");
            Ok(Arc::new(store))
        }
        None => {
            info!("attendance store: in-memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
