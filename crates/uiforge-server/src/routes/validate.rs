//! `POST /validate` — run the syntax validator over a supplied file list.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use uiforge_core::engine::GeneratedFile;
use uiforge_core::validate::{self, ValidationReport};

use crate::state::AppState;

/// Request body: the files to check.
#[derive(Debug, Deserialize)]
pub struct ValidateBody {
    pub files: Vec<GeneratedFile>,
}

/// Validate the supplied files and return the report.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateBody>,
) -> Json<ValidationReport> {
    let report = validate::validate_files(&body.files);
    state.metrics.record_request("validate", "ok").await;
    Json(report)
}
