//! The generation endpoints: `POST /generate` (single composite call) and
//! `POST /generate/chained` (the 11-stage pipeline).
//!
//! Request flow: rate limit → input validation/sanitization → cache lookup →
//! engine → metrics + cache fill. Validation failures never reach the LLM.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use uiforge_core::cache::{self, PipelineMode};
use uiforge_core::engine::chained::ChainedEngine;
use uiforge_core::engine::{single, GenerationRequest, GenerationResponse};
use uiforge_core::error::ErrorCode;
use uiforge_core::image::ImageAttachment;
use uiforge_core::llm::pricing;
use uiforge_core::sanitize;
use uiforge_core::stack::TechStack;

use crate::error::ApiError;
use crate::state::AppState;

/// The stack triple as submitted.
#[derive(Debug, Deserialize)]
pub struct TechStackBody {
    pub frontend: String,
    pub backend: String,
    pub database: String,
    #[serde(default)]
    pub architecture: Option<String>,
}

/// Request body for both generation endpoints.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub image_data: String,
    pub description: String,
    pub tech_stack: TechStackBody,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

/// Validate and sanitize a request body into an engine request.
///
/// Rejections happen here, before any LLM call, with 4000-series codes.
fn prepare(
    state: &AppState,
    body: GenerateBody,
    path: &str,
) -> Result<GenerationRequest, ApiError> {
    let stack = TechStack::parse(
        &body.tech_stack.frontend,
        &body.tech_stack.backend,
        &body.tech_stack.database,
        body.tech_stack.architecture.as_deref(),
    )
    .map_err(|e| ApiError::from_request_error(&e, path))?;

    let description = sanitize::clean_description(&body.description)
        .map_err(|e| ApiError::from_request_error(&e, path))?;

    let image = ImageAttachment::from_base64(&body.image_data, state.config.limits.max_image_bytes)
        .map_err(|e| ApiError::from_request_error(&e, path))?;

    let project_name = match body.project_name {
        Some(name) if !name.trim().is_empty() => sanitize::slugify(&name),
        _ => sanitize::slugify(&description),
    };

    Ok(GenerationRequest {
        image: Some(image),
        description,
        stack,
        project_name,
        custom_prompt: body.custom_prompt,
    })
}

/// Rate-limit admission shared by both endpoints.
async fn admit(
    state: &AppState,
    headers: &HeaderMap,
    endpoint: &str,
    path: &str,
) -> Result<(), ApiError> {
    let client = AppState::client_identity(headers);
    match state
        .limiter
        .try_acquire(&client, state.generation_class())
        .await
    {
        Ok(()) => Ok(()),
        Err(refusal) => {
            state.metrics.record_request(endpoint, "rejected").await;
            state.metrics.record_error(ErrorCode::RateLimited).await;
            Err(ApiError::new(
                ErrorCode::RateLimited,
                format!("rate limit exceeded, retry in {}s", refusal.seconds),
                path,
            )
            .with_retry_after(refusal.seconds))
        }
    }
}

fn request_fingerprint(request: &GenerationRequest, mode: PipelineMode) -> String {
    cache::fingerprint(
        request.image.as_ref().map(ImageAttachment::png_bytes),
        &request.description,
        &request.stack,
        &request.project_name,
        mode,
    )
}

/// `POST /generate` — one composite generation call.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerationResponse>, ApiError> {
    const ENDPOINT: &str = "generate";
    const PATH: &str = "/generate";
    let started = Instant::now();

    admit(&state, &headers, ENDPOINT, PATH).await?;

    let request = match prepare(&state, body, PATH) {
        Ok(request) => request,
        Err(api) => {
            state.metrics.record_request(ENDPOINT, "error").await;
            state.metrics.record_error(api.code()).await;
            return Err(api);
        }
    };

    // A custom prompt bypasses the cache entirely.
    let fingerprint = if request.custom_prompt.is_none() {
        let fp = request_fingerprint(&request, PipelineMode::Single);
        if let Some(cached) = state.cache.get(&fp).await {
            state.metrics.incr("cache.hits").await;
            state.metrics.record_request(ENDPOINT, "cached").await;
            state.metrics.record_latency(ENDPOINT, started.elapsed()).await;
            return Ok(Json(cached));
        }
        state.metrics.incr("cache.misses").await;
        Some(fp)
    } else {
        None
    };

    let outcome = match single::run_single(
        &state.provider,
        &request,
        state.config.llm.max_tokens,
        state.config.llm.temperature,
        state.config.llm.stage_timeout_secs,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            let api = ApiError::from_generation_error(&e, PATH, state.config.server.debug);
            state.metrics.record_request(ENDPOINT, "error").await;
            state.metrics.record_error(api.code()).await;
            return Err(api);
        }
    };

    let cost = pricing::lookup(&outcome.model)
        .compute_cost(outcome.usage.input_tokens, outcome.usage.output_tokens);
    state.metrics.record_llm_call(&outcome.usage, cost).await;
    if !outcome.validation.valid {
        state
            .metrics
            .incr_by("validation.failed_files", outcome.validation.errors.len() as u64)
            .await;
    }

    if let Some(fp) = fingerprint {
        state.cache.insert(fp, outcome.response.clone()).await;
    }

    state.metrics.record_request(ENDPOINT, "ok").await;
    state.metrics.record_latency(ENDPOINT, started.elapsed()).await;

    Ok(Json(outcome.response))
}

/// `POST /generate/chained` — the 11-stage pipeline.
pub async fn generate_chained(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerationResponse>, ApiError> {
    const ENDPOINT: &str = "generate_chained";
    const PATH: &str = "/generate/chained";
    let started = Instant::now();

    admit(&state, &headers, ENDPOINT, PATH).await?;

    let mut request = match prepare(&state, body, PATH) {
        Ok(request) => request,
        Err(api) => {
            state.metrics.record_request(ENDPOINT, "error").await;
            state.metrics.record_error(api.code()).await;
            return Err(api);
        }
    };
    // The chained path has no custom-prompt override.
    request.custom_prompt = None;

    let fingerprint = request_fingerprint(&request, PipelineMode::Chained);
    if let Some(cached) = state.cache.get(&fingerprint).await {
        state.metrics.incr("cache.hits").await;
        state.metrics.record_request(ENDPOINT, "cached").await;
        state.metrics.record_latency(ENDPOINT, started.elapsed()).await;
        return Ok(Json(cached));
    }
    state.metrics.incr("cache.misses").await;

    let engine = ChainedEngine::new(
        state.provider.clone(),
        state.config.llm.temperature,
        state.config.llm.stage_timeout_secs,
    );

    let outcome = match engine.run(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let api = ApiError::from_generation_error(&e, PATH, state.config.server.debug);
            state.metrics.record_request(ENDPOINT, "error").await;
            state.metrics.record_error(api.code()).await;
            return Err(api);
        }
    };

    let prices = pricing::lookup(&outcome.model);
    for stage in &outcome.stages {
        let cost = prices.compute_cost(stage.usage.input_tokens, stage.usage.output_tokens);
        state.metrics.record_llm_call(&stage.usage, cost).await;
        if stage.failed {
            state
                .metrics
                .incr(&format!("stages.{}.failed", stage.stage_name))
                .await;
        }
    }
    if outcome.duplicate_paths > 0 {
        state
            .metrics
            .incr_by("generation.duplicate_paths", outcome.duplicate_paths as u64)
            .await;
    }
    if !outcome.validation.valid {
        state
            .metrics
            .incr_by("validation.failed_files", outcome.validation.errors.len() as u64)
            .await;
    }

    // Archive in the vector store when configured; failures are advisory.
    if let Some(vector) = &state.vector {
        if let Err(err) = vector
            .upsert_project(
                &fingerprint,
                &request.description,
                &request.stack.summary(),
                outcome.response.files.len(),
            )
            .await
        {
            tracing::warn!(error = %err, "vector archive failed");
        }
    }

    state.cache.insert(fingerprint, outcome.response.clone()).await;

    state.metrics.record_request(ENDPOINT, "ok").await;
    state.metrics.record_latency(ENDPOINT, started.elapsed()).await;

    Ok(Json(outcome.response))
}
