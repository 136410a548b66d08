//! Indexing pipeline: upload notification → one search document.
//!
//! Steps run strictly in order (metadata, detection, write) and any failure
//! aborts the run before the write, so a failed run never leaves a partial
//! document behind.

use crate::{
    errors::{FailureKind, PipelineError},
    models::{
        event::UploadNotification,
        labels::{LabelSet, parse_custom_labels},
        photo::{IndexAck, PhotoDocument},
    },
    services::{
        opensearch::PhotoIndex,
        rekognition::{LabelDetector, MAX_DETECTED_LABELS},
        storage::ObjectStore,
    },
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct IndexingPipeline {
    store: Arc<dyn ObjectStore>,
    detector: Arc<dyn LabelDetector>,
    index: Arc<dyn PhotoIndex>,
}

impl IndexingPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        detector: Arc<dyn LabelDetector>,
        index: Arc<dyn PhotoIndex>,
    ) -> Self {
        Self {
            store,
            detector,
            index,
        }
    }

    /// Index one uploaded object. Errors carry the bucket and key.
    pub async fn run(&self, notification: &UploadNotification) -> Result<IndexAck, PipelineError> {
        let UploadNotification { bucket, object_key } = notification;
        self.index_object(bucket, object_key)
            .await
            .map_err(|err| err.for_object(bucket, object_key))
    }

    async fn index_object(&self, bucket: &str, key: &str) -> Result<IndexAck, PipelineError> {
        let labels = self.collect_labels(bucket, key).await?;

        let document = PhotoDocument::new(key, bucket, labels);
        let ack = self
            .index
            .index_document(&document)
            .await
            .map_err(|err| PipelineError::collaborator(FailureKind::IndexWrite, err))?;

        info!(
            bucket,
            key,
            id = %ack.id,
            labels = document.labels.len(),
            "photo indexed"
        );
        Ok(ack)
    }

    /// Custom labels from the object's metadata unioned with detected labels.
    async fn collect_labels(&self, bucket: &str, key: &str) -> Result<LabelSet, PipelineError> {
        let metadata = self
            .store
            .head_object_metadata(bucket, key)
            .await
            .map_err(|err| PipelineError::collaborator(FailureKind::Metadata, err))?;

        let mut labels: LabelSet = metadata
            .custom_labels
            .as_deref()
            .map(parse_custom_labels)
            .unwrap_or_default()
            .into_iter()
            .collect();

        let detected = self
            .detector
            .detect_labels(bucket, key, MAX_DETECTED_LABELS)
            .await
            .map_err(|err| PipelineError::collaborator(FailureKind::LabelDetection, err))?;
        debug!(bucket, key, custom = labels.len(), detected = detected.len(), "merging labels");

        labels.extend(
            detected
                .iter()
                .take(MAX_DETECTED_LABELS)
                .map(|label| label.name.as_str()),
        );
        Ok(labels)
    }
}
