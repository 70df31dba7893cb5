//! Mock implementation of ContentStore for testing

use crate::error::StoreError;
use crate::remote::{CommitInfo, ContentStore, RevisionMarker, StoredFile, WriteRequest};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use log::info;

/// Git-style content address: md5 over `blob <len>\0<content>`
pub fn content_revision(content: &[u8]) -> RevisionMarker {
    let mut context = md5::Context::new();
    context.consume(format!("blob {}\0", content.len()).as_bytes());
    context.consume(content);
    RevisionMarker::new(hex::encode(context.compute().0))
}

/// One accepted write, as recorded in the journal
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub path: String,
    pub message: String,
    /// Marker supplied by the caller, `None` for a create
    pub supplied_revision: Option<RevisionMarker>,
    pub revision: RevisionMarker,
}

/// Whether a stored call is a read or a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
}

#[derive(Default)]
struct MockState {
    files: HashMap<String, StoredFile>,
    journal: Vec<JournalEntry>,
    calls: Vec<(Operation, String)>,
    faults: HashMap<(Operation, String), StoreError>,
    commits: u64,
}

/// Mock implementation of ContentStore for testing
///
/// Enforces the same optimistic concurrency rules as the hosting API: a write
/// to an existing path must carry its current revision.
#[derive(Clone, Default)]
pub struct MockContentStore {
    // In-memory repository: path -> file
    state: Arc<Mutex<MockState>>,
}

impl MockContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A test that panicked while holding the lock must not hide the state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a file without going through the journal
    pub fn insert(&self, path: &str, content: impl Into<Bytes>) -> RevisionMarker {
        let content = content.into();
        let revision = content_revision(&content);
        self.lock().files.insert(
            path.to_string(),
            StoredFile { content, revision: revision.clone() },
        );
        revision
    }

    /// Current content of a path
    pub fn content(&self, path: &str) -> Option<Bytes> {
        self.lock().files.get(path).map(|f| f.content.clone())
    }

    /// Current revision of a path
    pub fn revision(&self, path: &str) -> Option<RevisionMarker> {
        self.lock().files.get(path).map(|f| f.revision.clone())
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    /// All paths currently stored, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Accepted writes in the order they happened
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock().journal.clone()
    }

    /// Every call in the order it arrived, including failed ones
    pub fn calls(&self) -> Vec<(Operation, String)> {
        self.lock().calls.clone()
    }

    /// Make the next `operation` on `path` fail with `error`
    pub fn fail_next(&self, operation: Operation, path: &str, error: StoreError) {
        self.lock().faults.insert((operation, path.to_string()), error);
    }

    /// Drop all files, journal entries and pending faults
    pub fn clear(&self) {
        *self.lock() = MockState::default();
    }
}

impl MockState {
    fn record(&mut self, operation: Operation, path: &str) -> Result<(), StoreError> {
        self.calls.push((operation, path.to_string()));
        match self.faults.remove(&(operation, path.to_string())) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    async fn read(&self, path: &str) -> Result<StoredFile, StoreError> {
        let mut state = self.lock();
        state.record(Operation::Read, path)?;
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { path: path.to_string() })
    }

    async fn write(&self, request: WriteRequest<'_>) -> Result<CommitInfo, StoreError> {
        let mut state = self.lock();
        state.record(Operation::Write, request.path)?;

        let current = state.files.get(request.path).map(|f| f.revision.clone());
        match (&current, request.revision) {
            (None, None) => {}
            (Some(current), Some(supplied)) if current == supplied => {}
            (None, Some(_)) => {
                return Err(StoreError::NotFound { path: request.path.to_string() });
            }
            _ => {
                info!("Mock: Rejected stale write to {}", request.path);
                return Err(StoreError::Conflict { path: request.path.to_string() });
            }
        }

        let content = Bytes::copy_from_slice(request.content);
        let revision = content_revision(&content);
        state.files.insert(
            request.path.to_string(),
            StoredFile { content, revision: revision.clone() },
        );
        state.commits += 1;
        let commit = format!("mock-commit-{}", state.commits);
        state.journal.push(JournalEntry {
            path: request.path.to_string(),
            message: request.message.to_string(),
            supplied_revision: request.revision.cloned(),
            revision: revision.clone(),
        });

        info!("Mock: Wrote {} ({} bytes) as {}", request.path, request.content.len(), commit);

        Ok(CommitInfo {
            path: request.path.to_string(),
            revision,
            commit,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write<'a>(path: &'a str, content: &'a [u8], revision: Option<&'a RevisionMarker>) -> WriteRequest<'a> {
        WriteRequest { path, content, message: "test", revision }
    }

    #[test]
    fn test_content_revision_matches_git_blob_shape() {
        let a = content_revision(b"hello");
        assert_eq!(a, content_revision(b"hello"));
        assert_ne!(a, content_revision(b"hello!"));
        assert_eq!(a.as_str().len(), 32);
    }

    #[tokio::test]
    async fn test_mock_store_create_then_update() {
        let store = MockContentStore::new();
        assert!(store.read("a.txt").await.unwrap_err().is_not_found());

        let created = store.write(write("a.txt", b"one", None)).await.unwrap();
        assert_eq!(store.content("a.txt").unwrap(), Bytes::from("one"));

        let updated = store.write(write("a.txt", b"two", Some(&created.revision))).await.unwrap();
        assert_ne!(created.revision, updated.revision);
        assert_eq!(store.read("a.txt").await.unwrap().revision, updated.revision);
        assert_eq!(store.journal().len(), 2);
        assert_ne!(created.commit, updated.commit);
    }

    #[tokio::test]
    async fn test_mock_store_rejects_stale_and_missing_markers() {
        let store = MockContentStore::new();
        let original = store.insert("a.txt", "one");

        // Existing file without a marker
        let result = store.write(write("a.txt", b"two", None)).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        store.write(write("a.txt", b"two", Some(&original))).await.unwrap();
        // Same marker again is now stale
        let result = store.write(write("a.txt", b"three", Some(&original))).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        // Marker for a file that does not exist
        let result = store.write(write("b.txt", b"x", Some(&original))).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(store.content("a.txt").unwrap(), Bytes::from("two"));
    }

    #[tokio::test]
    async fn test_mock_store_fault_injection_is_one_shot() {
        let store = MockContentStore::new();
        store.fail_next(Operation::Read, "a.txt", StoreError::RateLimited { path: "a.txt".into() });

        assert!(matches!(store.read("a.txt").await, Err(StoreError::RateLimited { .. })));
        assert!(matches!(store.read("a.txt").await, Err(StoreError::NotFound { .. })));
        assert_eq!(store.calls().len(), 2);

        store.clear();
        assert!(store.calls().is_empty());
        assert_eq!(store.file_count(), 0);
    }
}
