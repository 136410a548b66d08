//! Collaborator clients and the two pipelines built on top of them.

pub mod http;
pub mod indexer;
pub mod lex;
pub mod opensearch;
pub mod query;
pub mod rekognition;
pub mod sigv4;
pub mod storage;
