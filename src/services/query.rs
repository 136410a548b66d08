//! Query pipeline: free text → slots → terms search → signed results.

use crate::{
    errors::{FailureKind, PipelineError},
    models::{
        labels::normalize_label,
        photo::{QuerySlots, SearchResult},
    },
    services::{
        lex::SlotResolver,
        opensearch::{MAX_SEARCH_HITS, PhotoIndex},
        storage::{ObjectStore, PRESIGNED_URL_TTL},
    },
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct QueryPipeline {
    resolver: Arc<dyn SlotResolver>,
    index: Arc<dyn PhotoIndex>,
    store: Arc<dyn ObjectStore>,
}

impl QueryPipeline {
    pub fn new(
        resolver: Arc<dyn SlotResolver>,
        index: Arc<dyn PhotoIndex>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            resolver,
            index,
            store,
        }
    }

    /// Run a query. At most [`MAX_SEARCH_HITS`] results are returned and an
    /// unresolvable query yields an empty list without touching the index.
    pub async fn run(&self, query: &str) -> Result<Vec<SearchResult>, PipelineError> {
        if query.trim().is_empty() {
            return Err(PipelineError::invalid_input("query text is empty"));
        }

        let slots = self.resolve_slots(query).await?;
        if slots.is_empty() {
            info!(query, "no slots resolved, skipping search");
            return Ok(Vec::new());
        }

        let hits = self
            .index
            .search_terms(&slots, MAX_SEARCH_HITS)
            .await
            .map_err(|err| PipelineError::collaborator(FailureKind::Search, err))?;
        debug!(?slots, "search returned {} hit(s)", hits.len());

        let mut results = Vec::with_capacity(hits.len().min(MAX_SEARCH_HITS));
        for hit in hits.into_iter().take(MAX_SEARCH_HITS) {
            let url = self
                .store
                .presigned_get_url(&hit.bucket, &hit.object_key, PRESIGNED_URL_TTL)
                .await
                .map_err(|err| PipelineError::collaborator(FailureKind::UrlSigning, err))?;
            results.push(SearchResult {
                url,
                labels: hit.labels,
            });
        }

        info!(query, results = results.len(), "query answered");
        Ok(results)
    }

    async fn resolve_slots(&self, query: &str) -> Result<QuerySlots, PipelineError> {
        let slots = self
            .resolver
            .resolve_slots(query)
            .await
            .map_err(|err| PipelineError::collaborator(FailureKind::SlotResolution, err))?;

        Ok(slots
            .iter()
            .map(|slot| normalize_label(slot))
            .filter(|slot| !slot.is_empty())
            .collect())
    }
}
