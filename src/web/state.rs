use crate::catalog::Catalog;
use crate::config::Config;
use crate::storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Self {
        let catalog = Catalog::new(storage, config.storage.upload_root.clone());
        Self {
            catalog,
            config: Arc::new(config),
        }
    }
}
