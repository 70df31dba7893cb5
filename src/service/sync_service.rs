//! Sync service: commits one submission to its fixed destinations

use bytes::Bytes;
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{Catalog, Destination, DestinationKind};
use crate::error::{Phase, SyncError};
use crate::logging::{next_submission_id, LogContext, DESTINATION_KEY, SUBMISSION_KEY};
use crate::metadata::{MetadataDocument, MetadataValues};
use crate::remote::{CommitInfo, RemoteClient};
use crate::slots::{map_slots, MappedSlot};

/// A decoded upload batch
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    /// Images in slot order
    pub images: Vec<Bytes>,
    /// Songs in slot order
    pub songs: Vec<Bytes>,
    /// Images with an explicit target filename
    pub named_images: Vec<(String, Bytes)>,
    /// Songs with an explicit target filename
    pub named_songs: Vec<(String, Bytes)>,
    /// Text values for the metadata document
    pub values: MetadataValues,
}

/// What a successful submission committed, in commit order
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub submission: String,
    pub committed: Vec<CommitInfo>,
}

/// Sync service sequencing every destination write of a submission
pub struct SyncService {
    client: RemoteClient,
    catalog: Arc<Catalog>,
}

impl SyncService {
    /// Create a new sync service with injected client and destination catalog
    pub fn new(client: RemoteClient, catalog: Arc<Catalog>) -> Self {
        Self { client, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Commit the metadata document, then the image slots, then the song slots
    ///
    /// Destinations are written one at a time and the first failure stops the
    /// submission. Destinations committed before the failure stay committed.
    pub async fn submit(&self, batch: UploadBatch) -> Result<SyncReport, SyncError> {
        let submission = next_submission_id();
        let context = LogContext::new().with(SUBMISSION_KEY, submission.as_str());

        let result = context.scope(self.run(submission.clone(), batch)).await;
        let _entered = context.enter();
        match &result {
            Ok(report) => info!("Submission {} committed {} destination(s)", submission, report.committed.len()),
            Err(e) => error!("Submission {} failed: {}", submission, e),
        }
        result
    }

    async fn run(&self, submission: String, batch: UploadBatch) -> Result<SyncReport, SyncError> {
        // Everything that can be rejected locally is checked before the first write
        let images = map_slots(&self.catalog, DestinationKind::Image, batch.images, batch.named_images)?;
        let songs = map_slots(&self.catalog, DestinationKind::Song, batch.songs, batch.named_songs)?;
        let document = MetadataDocument::compose(&batch.values).to_json()?;

        info!(
            "Submission {}: metadata + {} image(s) + {} song(s) via {}",
            submission,
            images.len(),
            songs.len(),
            self.client.backend_name()
        );

        let mut report = SyncReport { submission, committed: Vec::new() };
        report.committed.push(self.sync_destination(self.catalog.metadata(), &document).await?);

        for MappedSlot { destination, blob, .. } in images.iter().chain(songs.iter()) {
            report.committed.push(self.sync_destination(destination, blob).await?);
        }

        Ok(report)
    }

    /// Replace the whole metadata document, leaving media slots untouched
    ///
    /// Values not supplied here are reset to their empty defaults; nothing from
    /// the stored document is carried over.
    pub async fn replace_metadata(&self, values: &MetadataValues) -> Result<CommitInfo, SyncError> {
        let document = MetadataDocument::compose(values).to_json()?;
        self.sync_destination(self.catalog.metadata(), &document).await
    }

    /// Resolve the current revision of one destination and write it
    async fn sync_destination(&self, destination: &Destination, content: &[u8]) -> Result<CommitInfo, SyncError> {
        let context = LogContext::new().with(DESTINATION_KEY, destination.path.as_str());
        context
            .scope(async {
                let revision = self
                    .client
                    .resolve_revision(&destination.path)
                    .await
                    .map_err(|e| SyncError::store(&destination.path, Phase::Resolve, e))?;

                let message = format!("Add/update {} {}", destination.kind.label(), destination.filename());
                self.client
                    .write(&destination.path, content, &message, revision.as_ref())
                    .await
                    .map_err(|e| SyncError::store(&destination.path, Phase::Write, e))
            })
            .await
    }
}
