//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::repository::FullRepository;
use crate::storage::ObjectStorage;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Object store for uploaded receipts
    pub storage: Arc<dyn ObjectStorage>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        storage: Arc<dyn ObjectStorage>,
        config: ServerConfig,
    ) -> Self {
        Self {
            repository,
            storage,
            config: Arc::new(config),
        }
    }

    pub fn repo(&self) -> &dyn FullRepository {
        self.repository.as_ref()
    }

    pub fn store(&self) -> &dyn ObjectStorage {
        self.storage.as_ref()
    }
}
