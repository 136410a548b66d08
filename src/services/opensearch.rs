//! Search index collaborator.
//!
//! Documents are written with `_doc` (always a fresh id, never an upsert) and
//! looked up with an exact `terms` query over the keyword sub-field of
//! `labels`.

use crate::{
    errors::ClientResult,
    models::photo::{IndexAck, PhotoDocument, PhotoHit},
    services::http::{SignedClient, decode_json, endpoint_url},
};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Maximum hits requested per query.
pub const MAX_SEARCH_HITS: usize = 10;

const LABEL: &str = "opensearch";

#[async_trait]
pub trait PhotoIndex: Send + Sync + 'static {
    async fn index_document(&self, document: &PhotoDocument) -> ClientResult<IndexAck>;

    /// Documents whose labels intersect `terms`, at most `size` of them.
    async fn search_terms(&self, terms: &[String], size: usize) -> ClientResult<Vec<PhotoHit>>;

    /// Cheap reachability check for readiness probes.
    async fn ping(&self) -> ClientResult<()>;
}

#[derive(Clone, Debug)]
pub struct OpenSearchClient {
    client: SignedClient,
    base_url: String,
    index: String,
    service: String,
}

impl OpenSearchClient {
    pub fn new(
        client: SignedClient,
        base_url: impl Into<String>,
        index: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            index: index.into(),
            service: service.into(),
        }
    }
}

/// Body of a labels `terms` query.
pub fn terms_query(terms: &[String], size: usize) -> Value {
    json!({
        "size": size,
        "query": {
            "terms": { "labels.keyword": terms }
        }
    })
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Hits,
}

#[derive(Deserialize, Default)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: PhotoHit,
}

#[async_trait]
impl PhotoIndex for OpenSearchClient {
    async fn index_document(&self, document: &PhotoDocument) -> ClientResult<IndexAck> {
        let url = endpoint_url(LABEL, &self.base_url, &[self.index.as_str(), "_doc"])?;
        let ack: IndexAck = self
            .client
            .post_json(
                LABEL,
                &self.service,
                url,
                &[("content-type", "application/json")],
                document,
            )
            .await?;
        debug!(id = %ack.id, result = %ack.result, "indexed document");
        Ok(ack)
    }

    async fn search_terms(&self, terms: &[String], size: usize) -> ClientResult<Vec<PhotoHit>> {
        let url = endpoint_url(LABEL, &self.base_url, &[self.index.as_str(), "_search"])?;
        let response: SearchResponse = self
            .client
            .post_json(
                LABEL,
                &self.service,
                url,
                &[("content-type", "application/json")],
                &terms_query(terms, size),
            )
            .await?;

        let hits: Vec<PhotoHit> = response.hits.hits.into_iter().map(|hit| hit.source).collect();
        debug!(?terms, "search returned {} hit(s)", hits.len());
        Ok(hits)
    }

    async fn ping(&self) -> ClientResult<()> {
        let url = endpoint_url(LABEL, &self.base_url, &[])?;
        let response = self
            .client
            .send(LABEL, &self.service, Method::GET, url, &[], Vec::new())
            .await?;
        let _: Value = decode_json(LABEL, response).await?;
        Ok(())
    }
}
