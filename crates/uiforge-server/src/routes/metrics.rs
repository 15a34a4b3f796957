//! `GET /metrics` — the process-wide metrics snapshot.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// Serve the metrics snapshot.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.metrics.snapshot().await)
}
