//! Cache operational endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// `GET /cache/stats` — counters and occupancy.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.cache.stats().await;
    Json(serde_json::to_value(stats).unwrap_or_else(|_| json!({})))
}

/// `POST /cache/clear` — drop every entry.
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let cleared = state.cache.clear().await;
    tracing::info!(cleared, "cache cleared");
    Json(json!({"cleared": cleared}))
}

/// `DELETE /cache/entry/{fingerprint}` — drop one entry.
pub async fn remove_entry(
    State(state): State<Arc<AppState>>,
    Path(fingerprint): Path<String>,
) -> Json<serde_json::Value> {
    let removed = state.cache.remove(&fingerprint).await;
    Json(json!({"removed": removed}))
}
