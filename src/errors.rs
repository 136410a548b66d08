use crate::{response::ApiResponse, services::sigv4::SigningError};
use axum::response::{IntoResponse, Response};
use std::fmt;
use thiserror::Error;

/// A failed call to one of the external collaborators.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} json error: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {service} url: {source}")]
    Url {
        service: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{service} path segment `{segment}` would be resolved away")]
    DotSegment {
        service: &'static str,
        segment: String,
    },
    #[error(transparent)]
    Signing(#[from] SigningError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Which step of a pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    Metadata,
    LabelDetection,
    IndexWrite,
    SlotResolution,
    Search,
    UrlSigning,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            FailureKind::InvalidInput => "input validation",
            FailureKind::Metadata => "metadata fetch",
            FailureKind::LabelDetection => "label detection",
            FailureKind::IndexWrite => "index write",
            FailureKind::SlotResolution => "slot resolution",
            FailureKind::Search => "search",
            FailureKind::UrlSigning => "url signing",
        };
        f.write_str(step)
    }
}

/// Terminal failure of an indexing or query run.
///
/// Every variant renders as the 500 failure response; the message carries the
/// original error text.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{kind} failed: {source}")]
    Collaborator {
        kind: FailureKind,
        #[source]
        source: ClientError,
    },

    #[error("object `{key}` in bucket `{bucket}`: {source}")]
    Indexing {
        bucket: String,
        key: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        PipelineError::InvalidInput(msg.into())
    }

    pub fn collaborator(kind: FailureKind, source: ClientError) -> Self {
        PipelineError::Collaborator { kind, source }
    }

    /// Attach the object being indexed to a failure.
    pub fn for_object(self, bucket: &str, key: &str) -> Self {
        PipelineError::Indexing {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::InvalidInput(_) => FailureKind::InvalidInput,
            PipelineError::Collaborator { kind, .. } => *kind,
            PipelineError::Indexing { source, .. } => source.kind(),
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::failure(self.to_string()).into_response()
    }
}
