//! Object storage collaborator: custom-label metadata and presigned links.

use crate::{
    errors::ClientResult,
    services::http::{SignedClient, endpoint_url, header_str, is_dot_segment},
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const CUSTOM_LABELS_HEADER: &str = "x-amz-meta-customlabels";

/// Presigned links stay valid for one hour.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(3600);

const LABEL: &str = "s3";
const SERVICE: &str = "s3";

/// User metadata attached to an object at upload time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Raw comma-separated custom labels, if the uploader supplied any.
    pub custom_labels: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn head_object_metadata(&self, bucket: &str, key: &str) -> ClientResult<ObjectMetadata>;

    async fn presigned_get_url(&self, bucket: &str, key: &str, ttl: Duration)
    -> ClientResult<String>;
}

/// Path-style S3 client: `{base_url}/{bucket}/{key}`.
#[derive(Clone, Debug)]
pub struct S3Client {
    client: SignedClient,
    base_url: String,
}

impl S3Client {
    pub fn new(client: SignedClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Keys keep their `/` separators; every other reserved byte is encoded.
    ///
    /// A key with a `.` or `..` segment is sent as one segment with its
    /// separators encoded as `%2F`, so the path is not resolved and S3 still
    /// decodes the original key.
    fn object_url(&self, bucket: &str, key: &str) -> ClientResult<Url> {
        let mut segments = vec![bucket];
        if key.split('/').any(is_dot_segment) {
            segments.push(key);
        } else {
            segments.extend(key.split('/'));
        }
        endpoint_url(LABEL, &self.base_url, &segments)
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn head_object_metadata(&self, bucket: &str, key: &str) -> ClientResult<ObjectMetadata> {
        let url = self.object_url(bucket, key)?;
        let response = self
            .client
            .send(LABEL, SERVICE, Method::HEAD, url, &[], Vec::new())
            .await?;

        let custom_labels = header_str(response.headers().get(CUSTOM_LABELS_HEADER));
        debug!(bucket, key, ?custom_labels, "fetched object metadata");

        Ok(ObjectMetadata { custom_labels })
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> ClientResult<String> {
        let url = self.object_url(bucket, key)?;
        let presigned =
            self.client
                .signer()
                .presign_url(SERVICE, "GET", &url, ttl.as_secs(), Utc::now())?;
        Ok(presigned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::ClientError,
        services::sigv4::{Credentials, SigV4Signer},
    };
    use std::sync::Arc;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header_exists, method, path},
    };

    fn client(base_url: &str) -> S3Client {
        let signer = SigV4Signer::new(Credentials::new("AKID", "secret", None), "us-east-1");
        S3Client::new(
            SignedClient::new(reqwest::Client::new(), Arc::new(signer)),
            base_url,
        )
    }

    #[tokio::test]
    async fn head_reads_custom_labels_header() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/uploads/2024/dog%20park.jpg"))
            .and(header_exists("authorization"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("x-amz-meta-customlabels", "Cat, tree"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let meta = client(&server.uri())
            .head_object_metadata("uploads", "2024/dog park.jpg")
            .await
            .unwrap();
        assert_eq!(meta.custom_labels.as_deref(), Some("Cat, tree"));
    }

    #[tokio::test]
    async fn head_without_metadata_has_no_custom_labels() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let meta = client(&server.uri())
            .head_object_metadata("uploads", "a.jpg")
            .await
            .unwrap();
        assert_eq!(meta, ObjectMetadata::default());
    }

    #[tokio::test]
    async fn head_missing_object_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .head_object_metadata("uploads", "gone.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { service: "s3", status: 404, .. }));
    }

    #[tokio::test]
    async fn presigned_url_points_at_object() {
        let url = client("https://s3.us-east-1.amazonaws.com")
            .presigned_get_url("uploads", "trips/beach day.jpg", PRESIGNED_URL_TTL)
            .await
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("s3.us-east-1.amazonaws.com"));
        assert_eq!(parsed.path(), "/uploads/trips/beach%20day.jpg");
        assert!(parsed
            .query_pairs()
            .any(|(k, v)| k == "X-Amz-Expires" && v == "3600"));
        assert!(parsed.query_pairs().any(|(k, _)| k == "X-Amz-Signature"));
    }

    #[tokio::test]
    async fn dot_segment_keys_address_the_literal_object() {
        let store = client("https://s3.us-east-1.amazonaws.com");
        for (key, expected) in [
            ("albums/../cat.jpg", "/uploads/albums%2F..%2Fcat.jpg"),
            ("./dog.jpg", "/uploads/.%2Fdog.jpg"),
            ("a/..", "/uploads/a%2F.."),
        ] {
            let url = store
                .presigned_get_url("uploads", key, PRESIGNED_URL_TTL)
                .await
                .unwrap();
            assert_eq!(Url::parse(&url).unwrap().path(), expected, "{key}");
        }
    }

    #[tokio::test]
    async fn head_of_dot_segment_key_keeps_the_key_intact() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/uploads/albums%2F..%2Fcat.jpg"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("x-amz-meta-customlabels", "cat"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let meta = client(&server.uri())
            .head_object_metadata("uploads", "albums/../cat.jpg")
            .await
            .unwrap();
        assert_eq!(meta.custom_labels.as_deref(), Some("cat"));
    }

    #[tokio::test]
    async fn bare_dot_keys_are_refused() {
        for key in [".", ".."] {
            let err = client("https://s3.us-east-1.amazonaws.com")
                .presigned_get_url("uploads", key, PRESIGNED_URL_TTL)
                .await
                .unwrap_err();
            assert!(matches!(err, ClientError::DotSegment { service: "s3", .. }), "{key}");
        }
    }
}
