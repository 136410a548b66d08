//! HTTP handlers for the two pipelines.
//!
//! Every outcome maps onto one of the two fixed response shapes; failures are
//! never turned into an empty success.

use crate::{
    errors::PipelineError,
    models::{event::UploadNotification, photo::SearchResult},
    response::{ApiResponse, CORS_HEADERS},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{Instrument, error, info_span};
use url::form_urlencoded;
use uuid::Uuid;

/// `POST /photos/index`: body is an upload event notification.
pub async fn index_photo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse<()>, PipelineError> {
    let span = info_span!("index_photo", invocation_id = %Uuid::new_v4());
    async move {
        let notification = UploadNotification::from_slice(&body)
            .inspect_err(|err| error!(kind = %err.kind(), "rejected upload event: {}", err))?;
        state.indexer.run(&notification).await.inspect_err(|err| {
            error!(
                bucket = %notification.bucket,
                key = %notification.object_key,
                kind = %err.kind(),
                "indexing failed: {}",
                err
            )
        })?;
        Ok::<_, PipelineError>(ApiResponse::success())
    }
    .instrument(span)
    .await
}

/// `GET /photos/search?q=...`
pub async fn search_photos(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<ApiResponse<Vec<SearchResult>>, PipelineError> {
    let span = info_span!("search_photos", invocation_id = %Uuid::new_v4());
    async move {
        let q = query_param(raw.as_deref(), "q")
            .ok_or_else(|| PipelineError::invalid_input("missing query parameter `q`"))
            .inspect_err(|err| error!(kind = %err.kind(), "rejected query: {}", err))?;
        let results = state
            .query
            .run(&q)
            .await
            .inspect_err(|err| error!(query = %q, kind = %err.kind(), "query failed: {}", err))?;
        Ok::<_, PipelineError>(ApiResponse::with_data(results))
    }
    .instrument(span)
    .await
}

/// `OPTIONS` on the pipeline routes.
pub async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, CORS_HEADERS)
}

fn query_param(raw: Option<&str>, name: &str) -> Option<String> {
    form_urlencoded::parse(raw?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
