//! Shared application state handed to every handler.
//!
//! Holds only already-constructed, immutable collaborator handles; invocations
//! share the connection pool but no mutable state.

use crate::{
    config::AppConfig,
    services::{
        http::SignedClient,
        indexer::IndexingPipeline,
        lex::{BotTarget, LexClient, SlotResolver},
        opensearch::{OpenSearchClient, PhotoIndex},
        query::QueryPipeline,
        rekognition::{LabelDetector, RekognitionClient},
        sigv4::SigV4Signer,
        storage::{ObjectStore, S3Client},
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub indexer: IndexingPipeline,
    pub query: QueryPipeline,
    pub index: Arc<dyn PhotoIndex>,
}

impl AppState {
    /// Wire the pipelines from explicit collaborator handles.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        detector: Arc<dyn LabelDetector>,
        resolver: Arc<dyn SlotResolver>,
        index: Arc<dyn PhotoIndex>,
    ) -> Self {
        Self {
            indexer: IndexingPipeline::new(store.clone(), detector, index.clone()),
            query: QueryPipeline::new(resolver, index.clone(), store),
            index,
        }
    }

    /// Build the HTTP-backed collaborators from configuration.
    pub fn from_config(cfg: &AppConfig, http: reqwest::Client, signer: SigV4Signer) -> Self {
        let client = SignedClient::new(http, Arc::new(signer));

        let store = S3Client::new(client.clone(), cfg.s3_url.clone());
        let detector = RekognitionClient::new(client.clone(), cfg.rekognition_url.clone());
        let resolver = LexClient::new(
            client.clone(),
            cfg.lex_url.clone(),
            BotTarget {
                bot_id: cfg.bot_id.clone(),
                bot_alias_id: cfg.bot_alias_id.clone(),
                locale_id: cfg.locale_id.clone(),
                session_id: cfg.lex_session_id.clone(),
            },
        );
        let index = OpenSearchClient::new(
            client,
            cfg.opensearch_url.clone(),
            cfg.opensearch_index.clone(),
            cfg.search_service.clone(),
        );

        Self::new(
            Arc::new(store),
            Arc::new(detector),
            Arc::new(resolver),
            Arc::new(index),
        )
    }
}
