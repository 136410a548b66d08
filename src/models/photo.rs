//! Documents stored in the search index and results handed back to clients.

use super::labels::LabelSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One indexed photo.
///
/// Created once per indexing run and never updated; re-indexing the same
/// object produces a second document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDocument {
    /// Decoded object key within the bucket.
    pub object_key: String,

    /// Bucket holding the photo.
    pub bucket: String,

    /// Index-write time, not upload time.
    pub created_timestamp: DateTime<Utc>,

    /// Union of custom and detected labels.
    pub labels: LabelSet,
}

impl PhotoDocument {
    /// Build a document stamped with the current time.
    pub fn new(object_key: impl Into<String>, bucket: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            object_key: object_key.into(),
            bucket: bucket.into(),
            created_timestamp: Utc::now(),
            labels,
        }
    }
}

/// Stored fields of a search hit.
///
/// Kept separate from [`PhotoDocument`] so hits written by older indexers
/// without a timestamp still deserialize. Labels are returned exactly as
/// stored, without renormalizing.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoHit {
    pub object_key: String,
    pub bucket: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// A photo returned to a querying client.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Time-limited signed access link.
    pub url: String,
    pub labels: Vec<String>,
}

/// Normalized slot values extracted from a free-text query.
pub type QuerySlots = Vec<String>;

/// Write acknowledgement returned by the search index.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct IndexAck {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub result: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_uses_camel_case_fields() {
        let labels: LabelSet = ["Dog", "cat"].into_iter().collect();
        let doc = PhotoDocument::new("trips/beach.jpg", "photos-bucket", labels);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["objectKey"], json!("trips/beach.jpg"));
        assert_eq!(value["bucket"], json!("photos-bucket"));
        assert_eq!(value["labels"], json!(["cat", "dog"]));
        assert!(value["createdTimestamp"].is_string());
    }

    #[test]
    fn hit_tolerates_missing_labels() {
        let hit: PhotoHit =
            serde_json::from_value(json!({"objectKey": "a.jpg", "bucket": "b"})).unwrap();
        assert!(hit.labels.is_empty());
    }

    #[test]
    fn hit_labels_pass_through_as_stored() {
        let hit: PhotoHit = serde_json::from_value(json!({
            "objectKey": "a.jpg",
            "bucket": "b",
            "labels": ["Tree ", "dog", "Dog"]
        }))
        .unwrap();
        assert_eq!(hit.labels, vec!["Tree ", "dog", "Dog"]);
    }
}
