//! Service identity and liveness endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::json;

use uiforge_core::error::ErrorCode;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /` — service identity. No auth, no rate limit.
pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.metrics.record_request("root", "ok").await;
    Json(json!({
        "service": "uiforge",
        "version": uiforge_core::version(),
    }))
}

/// `GET /health` — liveness plus external-dependency status. No auth;
/// rate-limited under the operational class.
pub async fn health(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let client = AppState::client_identity(&headers);
    if let Err(refusal) = state
        .limiter
        .try_acquire(&client, state.operational_class())
        .await
    {
        state.metrics.record_request("health", "rejected").await;
        state.metrics.record_error(ErrorCode::RateLimited).await;
        return Err(ApiError::new(
            ErrorCode::RateLimited,
            format!("rate limit exceeded, retry in {}s", refusal.seconds),
            "/health",
        )
        .with_retry_after(refusal.seconds));
    }

    state.metrics.record_request("health", "ok").await;
    Ok(Json(json!({
        "status": "ok",
        "version": uiforge_core::version(),
        "llm": {
            "provider": state.provider.name(),
            "model": state.config.llm.model,
            "configured": !state.config.llm.api_key.is_empty(),
        },
        "cache_enabled": state.config.cache.enabled,
        "rate_limit_enabled": state.config.limits.rate_limit_enabled,
        "vector_store_configured": state.vector.is_some(),
    })))
}
