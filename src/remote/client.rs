//! Revision-aware client over a ContentStore

use std::sync::Arc;
use log::{debug, info, warn};

use crate::error::StoreError;
use crate::remote::{CommitInfo, ContentStore, RevisionMarker, WriteRequest};

/// Resolves revision markers and performs create-or-update writes
///
/// Nothing is cached: every marker comes from a read issued for the write that
/// uses it, and no call is ever retried.
#[derive(Clone)]
pub struct RemoteClient {
    store: Arc<dyn ContentStore>,
}

impl RemoteClient {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Current revision of `path`, `None` when it does not exist yet
    ///
    /// Only a not-found answer maps to `None`; any other failure is returned so
    /// a transient error is never treated as a missing file.
    pub async fn resolve_revision(&self, path: &str) -> Result<Option<RevisionMarker>, StoreError> {
        match self.store.read(path).await {
            Ok(file) => {
                debug!("{} is at revision {}", path, file.revision);
                Ok(Some(file.revision))
            }
            Err(e) if e.is_not_found() => {
                debug!("{} does not exist yet", path);
                Ok(None)
            }
            Err(e) => {
                warn!("Could not resolve revision of {}: {}", e.path(), e);
                Err(e)
            }
        }
    }

    /// Create `path` when `revision` is `None`, otherwise update it in place
    pub async fn write(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        revision: Option<&RevisionMarker>,
    ) -> Result<CommitInfo, StoreError> {
        let request = WriteRequest { path, content, message, revision };
        let commit = self.store.write(request).await.map_err(|e| {
            warn!("Write to {} rejected: {}", e.path(), e);
            e
        })?;
        info!(
            "{} {} ({} bytes) at revision {}",
            if revision.is_some() { "Updated" } else { "Created" },
            path,
            content.len(),
            commit.revision
        );
        Ok(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock_store::{MockContentStore, Operation};

    fn client() -> (MockContentStore, RemoteClient) {
        let store = MockContentStore::new();
        let client = RemoteClient::new(Arc::new(store.clone()));
        (store, client)
    }

    #[tokio::test]
    async fn test_resolve_revision_absent_and_present() {
        let (store, client) = client();
        assert_eq!(client.resolve_revision("a.txt").await.unwrap(), None);

        let revision = store.insert("a.txt", "content");
        assert_eq!(client.resolve_revision("a.txt").await.unwrap(), Some(revision));
    }

    #[tokio::test]
    async fn test_resolve_revision_propagates_transient_errors() {
        let (store, client) = client();
        store.fail_next(
            Operation::Read,
            "a.txt",
            StoreError::Unauthorized { path: "a.txt".into(), status: 401 },
        );
        let result = client.resolve_revision("a.txt").await;
        assert!(matches!(result, Err(StoreError::Unauthorized { .. })));
        // Nothing was written on the strength of the failed lookup
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn test_write_does_not_retry_conflicts() {
        let (store, client) = client();
        let stale = store.insert("a.txt", "one");
        store.insert("a.txt", "changed elsewhere");

        let result = client.write("a.txt", b"two", "update", Some(&stale)).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        let writes = store.calls().into_iter().filter(|(op, _)| *op == Operation::Write).count();
        assert_eq!(writes, 1);
        assert_eq!(store.content("a.txt").unwrap(), bytes::Bytes::from("changed elsewhere"));
    }
}
