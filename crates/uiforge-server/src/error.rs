//! API error responses.
//!
//! Maps core domain errors onto the wire error body: stable kind, four-digit
//! `ERR_NNNN` code, human message, optional detail (debug mode only),
//! ISO-8601 timestamp, and the request path. Rate-limit refusals also carry
//! a `Retry-After` header.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uiforge_core::error::{ErrorCode, GenerationError, RequestError};

/// API error type for route handlers.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<serde_json::Value>,
    retry_after: Option<u64>,
    path: String,
    include_details: bool,
}

impl ApiError {
    /// Build an error for a request path.
    pub fn new(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            retry_after: None,
            path: path.into(),
            include_details: false,
        }
    }

    /// Attach internal detail (only rendered in debug mode).
    pub fn with_details(mut self, details: serde_json::Value, debug: bool) -> Self {
        self.details = Some(details);
        self.include_details = debug;
        self
    }

    /// Attach a `Retry-After` hint in seconds.
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// The stable code (for metrics recording at the call site).
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Map a pre-LLM request rejection.
    pub fn from_request_error(err: &RequestError, path: impl Into<String>) -> Self {
        Self::new(err.code(), err.to_string(), path)
    }

    /// Map a pipeline failure.
    pub fn from_generation_error(
        err: &GenerationError,
        path: impl Into<String>,
        debug: bool,
    ) -> Self {
        Self::new(err.code(), err.to_string(), path)
            .with_details(json!({"source": format!("{err:?}")}), debug)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = self.code.as_str(), path = %self.path, "{}", self.message);
        } else {
            tracing::debug!(code = self.code.as_str(), path = %self.path, "{}", self.message);
        }

        let mut body = json!({
            "error": self.code.kind(),
            "error_code": self.code.as_str(),
            "message": self.message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "path": self.path,
        });
        if self.include_details {
            if let Some(details) = self.details {
                body["details"] = details;
            }
        }

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(seconds) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
        }
        response
    }
}
