//! Upload notifications delivered by the object store.
//!
//! Only the fields the indexer needs are modelled; everything else in the
//! event record is ignored.

use crate::errors::PipelineError;
use serde::Deserialize;

/// S3-style event notification: `{"Records": [{"s3": {...}}]}`.
#[derive(Deserialize, Debug)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Deserialize, Debug)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Deserialize, Debug)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Deserialize, Debug)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct S3Object {
    /// URL-encoded object key.
    pub key: String,
}

/// The decoded `(bucket, object_key)` pair an indexing run works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadNotification {
    pub bucket: String,
    pub object_key: String,
}

impl UploadNotification {
    /// Parse a raw event body. Only the first record is used.
    pub fn from_slice(body: &[u8]) -> Result<Self, PipelineError> {
        let event: S3Event = serde_json::from_slice(body)
            .map_err(|err| PipelineError::invalid_input(format!("malformed event: {err}")))?;
        Self::try_from(event)
    }
}

impl TryFrom<S3Event> for UploadNotification {
    type Error = PipelineError;

    fn try_from(event: S3Event) -> Result<Self, Self::Error> {
        let record = event
            .records
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::invalid_input("event contains no records"))?;

        let bucket = record.s3.bucket.name;
        if bucket.is_empty() {
            return Err(PipelineError::invalid_input("event bucket name is empty"));
        }
        let object_key = decode_object_key(&record.s3.object.key)?;
        if object_key.is_empty() {
            return Err(PipelineError::invalid_input("event object key is empty"));
        }

        Ok(Self { bucket, object_key })
    }
}

/// Decode an event key: `+` is a space, then percent-decoding as UTF-8.
pub fn decode_object_key(raw: &str) -> Result<String, PipelineError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|err| PipelineError::invalid_input(format!("object key `{raw}` is not UTF-8: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_plus_and_percent_sequences() {
        assert_eq!(
            decode_object_key("holiday+photos/caf%C3%A9%2B1.jpg").unwrap(),
            "holiday photos/café+1.jpg"
        );
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(decode_object_key("bad%FF.jpg").is_err());
    }

    #[test]
    fn takes_first_record() {
        let body = json!({
            "Records": [
                {"s3": {"bucket": {"name": "uploads"}, "object": {"key": "dog%20park.jpg", "size": 10}}},
                {"s3": {"bucket": {"name": "other"}, "object": {"key": "ignored.jpg"}}}
            ]
        });
        let notification = UploadNotification::from_slice(body.to_string().as_bytes()).unwrap();
        assert_eq!(
            notification,
            UploadNotification {
                bucket: "uploads".into(),
                object_key: "dog park.jpg".into()
            }
        );
    }

    #[test]
    fn missing_records_is_invalid_input() {
        let err = UploadNotification::from_slice(b"{}").unwrap_err();
        assert!(err.to_string().contains("no records"));

        let err = UploadNotification::from_slice(br#"{"Records":[{"s3":{}}]}"#).unwrap_err();
        assert!(err.to_string().contains("malformed event"));
    }
}
