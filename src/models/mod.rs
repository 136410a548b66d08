//! Core data models for photo indexing and search.
//!
//! Documents serialize with the camelCase field names the search index
//! stores, and labels are normalized on construction.

pub mod event;
pub mod labels;
pub mod photo;
