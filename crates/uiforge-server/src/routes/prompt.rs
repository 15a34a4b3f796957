//! `POST /prompt/preview` — the two prompt strings the builder would
//! produce, without invoking the LLM. A pure function of the request.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use uiforge_core::prompt::{self, PromptOptions};
use uiforge_core::sanitize;
use uiforge_core::stack::TechStack;

use crate::error::ApiError;
use crate::routes::generate::TechStackBody;
use crate::state::AppState;

/// Request body for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewBody {
    pub description: String,
    pub tech_stack: TechStackBody,
    #[serde(default)]
    pub project_name: Option<String>,
    /// Section toggles; defaults to the full-featured preset.
    #[serde(default)]
    pub include_styling: Option<bool>,
    #[serde(default)]
    pub include_testing: Option<bool>,
    #[serde(default)]
    pub include_docs: Option<bool>,
}

/// Preview the system and user prompts for a request.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PreviewBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    const PATH: &str = "/prompt/preview";

    let stack = TechStack::parse(
        &body.tech_stack.frontend,
        &body.tech_stack.backend,
        &body.tech_stack.database,
        body.tech_stack.architecture.as_deref(),
    )
    .map_err(|e| ApiError::from_request_error(&e, PATH))?;

    let description = sanitize::clean_description(&body.description)
        .map_err(|e| ApiError::from_request_error(&e, PATH))?;

    let project_name = match body.project_name {
        Some(name) if !name.trim().is_empty() => sanitize::slugify(&name),
        _ => sanitize::slugify(&description),
    };

    let defaults = PromptOptions::full_featured();
    let options = PromptOptions {
        include_styling: body.include_styling.unwrap_or(defaults.include_styling),
        include_testing: body.include_testing.unwrap_or(defaults.include_testing),
        include_docs: body.include_docs.unwrap_or(defaults.include_docs),
    };

    let system_prompt = prompt::build_system(&stack, &project_name, "web application", options);
    let user_prompt = prompt::build_user(&description, &stack, &[], true);

    state.metrics.record_request("prompt_preview", "ok").await;

    Ok(Json(json!({
        "system_prompt": system_prompt,
        "user_prompt": user_prompt,
        "project_name": project_name,
    })))
}
