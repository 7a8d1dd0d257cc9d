pub mod in_memory;
pub mod traits;

#[cfg(feature = "db")]
pub mod database;

pub use in_memory::InMemoryStorage;
pub use traits::{sort_lessons, Storage};

#[cfg(feature = "db")]
pub use database::DatabaseStorage;

use crate::config::StorageConfig;
use crate::error::Result;
use std::sync::Arc;

/// Opens the configured backend: the SQLite file with the `db` feature, memory otherwise.
pub async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    #[cfg(feature = "db")]
    {
        let storage = DatabaseStorage::open(&config.database_path).await?;
        Ok(Arc::new(storage))
    }

    #[cfg(not(feature = "db"))]
    {
        tracing::warn!(
            "Built without the `db` feature; data in {} is not used and changes are kept in memory",
            config.database_path.display()
        );
        Ok(Arc::new(InMemoryStorage::new()))
    }
}
