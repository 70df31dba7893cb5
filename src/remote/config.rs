//! Configuration for remote content store backends

use crate::config::RemoteSettings;
use crate::error::SyncError;
use crate::remote::{github_store::GitHubContentStore, mock_store::MockContentStore, ContentStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use log::info;

/// Available remote backends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RemoteBackend {
    GitHub,
    Mock,
}

impl Default for RemoteBackend {
    fn default() -> Self {
        RemoteBackend::GitHub
    }
}

impl std::str::FromStr for RemoteBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" | "gh" => Ok(RemoteBackend::GitHub),
            "mock" | "memory" => Ok(RemoteBackend::Mock),
            _ => Err(format!("Unknown remote backend: {}", s))
        }
    }
}

impl RemoteBackend {
    /// Create a content store instance for this backend
    pub fn create_store(&self, settings: &RemoteSettings) -> Result<Arc<dyn ContentStore>, SyncError> {
        match self {
            RemoteBackend::GitHub => {
                info!("Using GitHub backend for {}/{} on branch {}", settings.owner, settings.repo, settings.branch);
                Ok(Arc::new(GitHubContentStore::new(settings.clone())?))
            }
            RemoteBackend::Mock => {
                info!("Using in-memory mock backend");
                Ok(Arc::new(MockContentStore::new()))
            }
        }
    }
}
