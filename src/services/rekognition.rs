//! Image label detection collaborator.

use crate::{
    errors::ClientResult,
    services::http::{SignedClient, endpoint_url},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on detected labels per image.
pub const MAX_DETECTED_LABELS: usize = 10;

const LABEL: &str = "rekognition";
const SERVICE: &str = "rekognition";
const TARGET: &str = "RekognitionService.DetectLabels";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DetectedLabel {
    pub name: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[async_trait]
pub trait LabelDetector: Send + Sync + 'static {
    /// Detect at most `max_labels` labels for a stored object.
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        max_labels: usize,
    ) -> ClientResult<Vec<DetectedLabel>>;
}

#[derive(Clone, Debug)]
pub struct RekognitionClient {
    client: SignedClient,
    base_url: String,
}

impl RekognitionClient {
    pub fn new(client: SignedClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsRequest<'a> {
    image: Image<'a>,
    max_labels: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Image<'a> {
    s3_object: S3ObjectRef<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct S3ObjectRef<'a> {
    bucket: &'a str,
    name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsResponse {
    #[serde(default)]
    labels: Vec<DetectedLabel>,
}

#[async_trait]
impl LabelDetector for RekognitionClient {
    async fn detect_labels(
        &self,
        bucket: &str,
        key: &str,
        max_labels: usize,
    ) -> ClientResult<Vec<DetectedLabel>> {
        let url = endpoint_url(LABEL, &self.base_url, &[])?;
        let request = DetectLabelsRequest {
            image: Image {
                s3_object: S3ObjectRef { bucket, name: key },
            },
            max_labels,
        };

        let response: DetectLabelsResponse = self
            .client
            .post_json(
                LABEL,
                SERVICE,
                url,
                &[("content-type", CONTENT_TYPE), ("x-amz-target", TARGET)],
                &request,
            )
            .await?;

        debug!(bucket, key, "detected {} label(s)", response.labels.len());
        Ok(response.labels)
    }
}
