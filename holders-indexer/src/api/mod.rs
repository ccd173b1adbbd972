//! REST API surface: admin reindex trigger and the holders query endpoint.

mod admin;
mod query;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ports::HoldersCache;
use crate::store::PostgresStore;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct ApiState {
    /// Store backing both the cursor and holder-balance ports.
    pub store: Arc<PostgresStore>,
    /// First-page holders cache.
    pub cache: Arc<dyn HoldersCache>,
    /// Chain IDs this deployment is configured to serve, for admin validation.
    pub supported_chain_ids: Arc<[u64]>,
}

/// Build the application router.
#[must_use]
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/admin/reindex", post(admin::reindex))
        .route("/token/:address/holders", get(query::get_holders))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
