//! Defines routes for photo indexing and search.
//!
//! ## Structure
//! - **Pipeline endpoints**
//!   - `POST    /photos/index`: index an uploaded photo from its event notification
//!   - `GET     /photos/search?q=`: natural-language photo search
//!   - `OPTIONS` on both: CORS preflight
//!
//! - **Probes**
//!   - `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        photo_handlers::{index_photo, preflight, search_photos},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the router. Handlers share `AppState`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/photos/index", post(index_photo).options(preflight))
        .route("/photos/search", get(search_photos).options(preflight))
}

/// Router with state attached, ready to serve.
pub fn build_router(state: AppState) -> Router {
    routes().with_state(state)
}
