//! uiforge HTTP API server.
//!
//! Exposes the core generation pipeline as a REST API with bearer-key auth,
//! per-client rate limiting, response caching, and operational endpoints.

pub mod auth;
pub mod error;
pub mod headers;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the complete axum router with all API routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        // Generation
        .route("/generate", post(routes::generate::generate))
        .route("/generate/chained", post(routes::generate::generate_chained))
        // Prompt preview + validation
        .route("/prompt/preview", post(routes::prompt::preview))
        .route("/validate", post(routes::validate::validate))
        // Operational
        .route("/metrics", get(routes::metrics::metrics))
        .route("/cache/stats", get(routes::cache::stats))
        .route("/cache/clear", post(routes::cache::clear))
        .route("/cache/entry/{fingerprint}", delete(routes::cache::remove_entry))
        // Vector store (501 when unconfigured)
        .route("/pinecone/search/projects", post(routes::vectors::search_projects))
        .route("/pinecone/snippets/store", post(routes::vectors::store_snippet))
        .route("/pinecone/snippets/search", post(routes::vectors::search_snippets))
        .route("/pinecone/stats", get(routes::vectors::stats))
        .route("/pinecone/vectors/{id}", delete(routes::vectors::delete_vector))
        // Auth middleware — applied to all routes; exemptions are internal.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(middleware::from_fn(headers::security_headers))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
