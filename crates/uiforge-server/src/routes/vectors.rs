//! Optional vector-store endpoints.
//!
//! All handlers report 501 when the Pinecone feature is unconfigured; the
//! rest of the service is unaffected.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use uiforge_core::error::ErrorCode;
use uiforge_core::vector::PineconeClient;

use crate::error::ApiError;
use crate::state::AppState;

fn not_configured() -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({"error": "vector store not configured"})),
    )
        .into_response()
}

fn upstream_error(err: &uiforge_core::error::VectorError, path: &str) -> ApiError {
    ApiError::new(ErrorCode::UpstreamNetwork, err.to_string(), path)
}

fn client(state: &AppState) -> Option<&PineconeClient> {
    state.vector.as_ref()
}

/// Body for project similarity search.
#[derive(Debug, Deserialize)]
pub struct SearchProjectsBody {
    pub description: String,
    #[serde(default)]
    pub stack_summary: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// `POST /pinecone/search/projects`.
pub async fn search_projects(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchProjectsBody>,
) -> Response {
    let Some(vector) = client(&state) else {
        return not_configured();
    };
    match vector
        .search_projects(
            &body.description,
            body.stack_summary.as_deref().unwrap_or(""),
            body.top_k.unwrap_or(5),
        )
        .await
    {
        Ok(matches) => Json(json!({"matches": matches})).into_response(),
        Err(err) => upstream_error(&err, "/pinecone/search/projects").into_response(),
    }
}

/// Body for storing a snippet.
#[derive(Debug, Deserialize)]
pub struct StoreSnippetBody {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// `POST /pinecone/snippets/store`.
pub async fn store_snippet(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StoreSnippetBody>,
) -> Response {
    let Some(vector) = client(&state) else {
        return not_configured();
    };
    match vector
        .store_snippet(
            &body.id,
            &body.text,
            body.language.as_deref().unwrap_or("unknown"),
        )
        .await
    {
        Ok(()) => Json(json!({"stored": body.id})).into_response(),
        Err(err) => upstream_error(&err, "/pinecone/snippets/store").into_response(),
    }
}

/// Body for snippet similarity search.
#[derive(Debug, Deserialize)]
pub struct SearchSnippetsBody {
    pub text: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// `POST /pinecone/snippets/search`.
pub async fn search_snippets(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchSnippetsBody>,
) -> Response {
    let Some(vector) = client(&state) else {
        return not_configured();
    };
    match vector.search_snippets(&body.text, body.top_k.unwrap_or(5)).await {
        Ok(matches) => Json(json!({"matches": matches})).into_response(),
        Err(err) => upstream_error(&err, "/pinecone/snippets/search").into_response(),
    }
}

/// `GET /pinecone/stats`.
pub async fn stats(State(state): State<Arc<AppState>>) -> Response {
    let Some(vector) = client(&state) else {
        return not_configured();
    };
    match vector.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => upstream_error(&err, "/pinecone/stats").into_response(),
    }
}

/// `DELETE /pinecone/vectors/{id}`.
pub async fn delete_vector(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let Some(vector) = client(&state) else {
        return not_configured();
    };
    match vector.delete_vector(&id).await {
        Ok(()) => Json(json!({"deleted": id})).into_response(),
        Err(err) => upstream_error(&err, "/pinecone/vectors").into_response(),
    }
}
