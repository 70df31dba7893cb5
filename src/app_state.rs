//! Application State Management
//!
//! This module provides the application state that contains all services
//! and their dependencies, following the dependency injection pattern.

use std::sync::Arc;
use log::info;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::error::SyncError;
use crate::remote::{mock_store::MockContentStore, ContentStore, RemoteClient};
use crate::service::sync_service::SyncService;

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub sync_service: Arc<SyncService>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Result<Self, SyncError> {
        info!("Initializing application state with configuration");

        let settings = config.remote_settings()?;
        let store = config.remote.backend.create_store(&settings)?;

        Ok(Self::with_store(config, store))
    }

    /// Create application state around an already constructed content store
    pub fn with_store(config: AppConfig, store: Arc<dyn ContentStore>) -> Self {
        let catalog = Arc::new(Catalog::from_layout(&config.layout));
        info!(
            "Serving {} fixed destinations, metadata at {}",
            catalog.destinations().count(),
            catalog.metadata().path
        );

        // Create services with injected dependencies
        let sync_service = Arc::new(SyncService::new(RemoteClient::new(store), catalog));

        info!("Application state initialized successfully");
        Self { sync_service, config }
    }

    /// Create application state for testing with the mock backend
    ///
    /// The returned store handle shares state with the one the service writes to.
    pub fn new_for_testing() -> (Self, MockContentStore) {
        let store = MockContentStore::new();
        let state = Self::with_store(AppConfig::default(), Arc::new(store.clone()));
        (state, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::config::RemoteBackend;

    #[test]
    fn test_from_config_with_mock_backend() {
        let mut config = AppConfig::default();
        config.remote.backend = RemoteBackend::Mock;
        let state = AppState::from_config(config).unwrap();
        assert_eq!(state.sync_service.catalog().destinations().count(), 14);
    }

    #[test]
    fn test_new_for_testing_shares_store() {
        let (state, store) = AppState::new_for_testing();
        assert_eq!(state.config.remote.branch, "main");
        assert_eq!(store.file_count(), 0);
    }
}
