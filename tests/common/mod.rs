//! In-memory collaborator doubles shared by the integration specs.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use photo_search::{
    errors::{ClientError, ClientResult},
    models::{
        labels::LabelSet,
        photo::{IndexAck, PhotoDocument, PhotoHit, QuerySlots},
    },
    services::{
        lex::SlotResolver,
        opensearch::PhotoIndex,
        rekognition::{DetectedLabel, LabelDetector},
        sigv4::{Credentials, SigV4Signer},
        storage::{ObjectMetadata, ObjectStore},
    },
    state::AppState,
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use url::Url;

pub const STORAGE_BASE: &str = "https://storage.test";

fn failure(service: &'static str) -> ClientError {
    ClientError::Status {
        service,
        status: 500,
        body: "simulated outage".into(),
    }
}

/// Object store with fixed metadata; presigns for real against [`STORAGE_BASE`].
pub struct FakeStore {
    pub custom_labels: Option<String>,
    pub fail_head: bool,
    pub fail_presign: bool,
    pub head_calls: AtomicUsize,
    pub presign_calls: AtomicUsize,
    signer: SigV4Signer,
}

impl FakeStore {
    pub fn with_labels(custom_labels: Option<&str>) -> Self {
        Self {
            custom_labels: custom_labels.map(str::to_string),
            fail_head: false,
            fail_presign: false,
            head_calls: AtomicUsize::new(0),
            presign_calls: AtomicUsize::new(0),
            signer: SigV4Signer::new(
                Credentials::new("AKIDEXAMPLE", "test-secret", None),
                "us-east-1",
            ),
        }
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn head_object_metadata(&self, _bucket: &str, _key: &str) -> ClientResult<ObjectMetadata> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_head {
            return Err(failure("s3"));
        }
        Ok(ObjectMetadata {
            custom_labels: self.custom_labels.clone(),
        })
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> ClientResult<String> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_presign {
            return Err(failure("s3"));
        }
        let url = Url::parse(&format!("{STORAGE_BASE}/{bucket}/{key}")).map_err(|source| {
            ClientError::Url {
                service: "s3",
                source,
            }
        })?;
        let signed = self
            .signer
            .presign_url("s3", "GET", &url, ttl.as_secs(), Utc::now())?;
        Ok(signed.to_string())
    }
}

pub struct FakeDetector {
    pub labels: Vec<String>,
    pub fail: bool,
    pub calls: AtomicUsize,
    pub max_labels_seen: Mutex<Option<usize>>,
}

impl FakeDetector {
    pub fn with_labels(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
            max_labels_seen: Mutex::new(None),
        }
    }
}

#[async_trait]
impl LabelDetector for FakeDetector {
    async fn detect_labels(
        &self,
        _bucket: &str,
        _key: &str,
        max_labels: usize,
    ) -> ClientResult<Vec<DetectedLabel>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.max_labels_seen.lock().unwrap() = Some(max_labels);
        if self.fail {
            return Err(failure("rekognition"));
        }
        Ok(self
            .labels
            .iter()
            .map(|name| DetectedLabel {
                name: name.clone(),
                confidence: Some(99.0),
            })
            .collect())
    }
}

pub struct FakeResolver {
    pub slots: Vec<String>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeResolver {
    pub fn with_slots(slots: &[&str]) -> Self {
        Self {
            slots: slots.iter().map(|s| s.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SlotResolver for FakeResolver {
    async fn resolve_slots(&self, _text: &str) -> ClientResult<QuerySlots> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(failure("lex"));
        }
        Ok(self.slots.clone())
    }
}

/// Index that stores documents in memory and answers `terms` queries over them.
#[derive(Default)]
pub struct FakeIndex {
    pub documents: Mutex<Vec<PhotoDocument>>,
    pub fail_write: bool,
    pub fail_search: bool,
    /// Return every match, ignoring the requested size.
    pub ignore_size: bool,
    pub write_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl FakeIndex {
    pub fn seed(&self, key: &str, bucket: &str, labels: &[&str]) {
        let labels: LabelSet = labels.iter().collect();
        self.documents
            .lock()
            .unwrap()
            .push(PhotoDocument::new(key, bucket, labels));
    }

    pub fn stored(&self) -> Vec<PhotoDocument> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoIndex for FakeIndex {
    async fn index_document(&self, document: &PhotoDocument) -> ClientResult<IndexAck> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_write {
            return Err(failure("opensearch"));
        }
        let mut documents = self.documents.lock().unwrap();
        documents.push(document.clone());
        Ok(IndexAck {
            id: format!("doc-{}", documents.len()),
            result: "created".into(),
        })
    }

    async fn search_terms(&self, terms: &[String], size: usize) -> ClientResult<Vec<PhotoHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(failure("opensearch"));
        }
        let limit = if self.ignore_size { usize::MAX } else { size };
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|doc| doc.labels.iter().any(|label| terms.contains(label)))
            .take(limit)
            .map(|doc| PhotoHit {
                object_key: doc.object_key.clone(),
                bucket: doc.bucket.clone(),
                labels: doc.labels.iter().cloned().collect(),
            })
            .collect())
    }

    async fn ping(&self) -> ClientResult<()> {
        if self.fail_search {
            return Err(failure("opensearch"));
        }
        Ok(())
    }
}

pub struct Doubles {
    pub store: Arc<FakeStore>,
    pub detector: Arc<FakeDetector>,
    pub resolver: Arc<FakeResolver>,
    pub index: Arc<FakeIndex>,
}

impl Doubles {
    pub fn new(store: FakeStore, detector: FakeDetector, resolver: FakeResolver, index: FakeIndex) -> Self {
        Self {
            store: Arc::new(store),
            detector: Arc::new(detector),
            resolver: Arc::new(resolver),
            index: Arc::new(index),
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.store.clone(),
            self.detector.clone(),
            self.resolver.clone(),
            self.index.clone(),
        )
    }
}
