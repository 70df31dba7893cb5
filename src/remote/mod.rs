//! Remote Content Store Abstraction
//!
//! This module provides an abstraction over the hosting service that keeps the
//! published files, allowing the sync service to run against the GitHub REST
//! API or an in-memory store without affecting higher-level code.

pub mod client;
pub mod config;
pub mod github_store;
pub mod mock_store;


use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

pub use client::RemoteClient;

/// Opaque token identifying the stored revision of one path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionMarker(String);

impl RevisionMarker {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content and revision of a stored file
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub content: Bytes,
    pub revision: RevisionMarker,
}

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitInfo {
    /// Path that was written
    pub path: String,
    /// Revision of the path after the write
    pub revision: RevisionMarker,
    /// Identifier of the commit that carried the write
    pub commit: String,
}

/// One create-or-update request
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    pub path: &'a str,
    pub content: &'a [u8],
    pub message: &'a str,
    /// `None` creates the file, `Some` updates the revision it names
    pub revision: Option<&'a RevisionMarker>,
}

/// Trait defining the remote content store interface
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a file at the configured branch; fails with `NotFound` when absent
    async fn read(&self, path: &str) -> Result<StoredFile, StoreError>;

    /// Create or update a file; fails with `Conflict` when `revision` is stale
    async fn write(&self, request: WriteRequest<'_>) -> Result<CommitInfo, StoreError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
