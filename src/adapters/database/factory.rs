//! Store factory
//!
//! Builds the store trait objects for the backend named by `database_target`.
//! All three handles share one underlying client.

use crate::adapters::database::memory::MemoryStore;
use crate::adapters::database::traits::{DatasetStore, LockStore, NotificationStore};
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{CairnConfig, DatabaseTarget};
use crate::domain::{RepositoryError, Result};
use std::sync::Arc;

/// Handles onto one store backend
#[derive(Clone)]
pub struct Stores {
    pub datasets: Arc<dyn DatasetStore + Send + Sync>,
    pub locks: Arc<dyn LockStore + Send + Sync>,
    pub notifications: Arc<dyn NotificationStore + Send + Sync>,
}

impl Stores {
    /// Shares one memory store across all three handles
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            datasets: store.clone(),
            locks: store.clone(),
            notifications: store,
        }
    }
}

/// Create the stores based on the configuration
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing or the client
/// cannot be created.
pub async fn create_stores(config: &CairnConfig) -> Result<Stores> {
    match config.database_target {
        DatabaseTarget::Memory => {
            tracing::info!("Creating in-memory store");
            Ok(Stores::in_memory(Arc::new(MemoryStore::new())))
        }
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                RepositoryError::Configuration(
                    "postgresql section is required when database_target = \"postgresql\"".to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL store");
            let client = Arc::new(PostgreSQLClient::new(pg_config.clone()).await?);
            let adapter = Arc::new(PostgreSQLAdapter::new_with_arc(client));

            Ok(Stores {
                datasets: adapter.clone(),
                locks: adapter.clone(),
                notifications: adapter,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[tokio::test]
    async fn test_memory_target() {
        let config = parse_config(
            r#"
database_target = "memory"

[registry]
provider = "datacite"
base_url = "https://api.test.datacite.org"
username = "TEST"
password = "secret"
"#,
        )
        .unwrap();

        let stores = create_stores(&config).await.unwrap();
        stores.datasets.test_connection().await.unwrap();
        assert!(stores.locks.list_locks(&Default::default()).await.unwrap().is_empty());
    }
}
