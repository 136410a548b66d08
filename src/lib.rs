//! Label-based photo indexing and natural-language photo search.
//!
//! Uploads are indexed by their custom and detected labels; queries are
//! resolved into label slots and answered with presigned links.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
