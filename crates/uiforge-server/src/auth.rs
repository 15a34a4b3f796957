//! Bearer-key authentication for the uiforge API.
//!
//! Keys come from configuration. When auth is required but no keys are
//! configured, one ephemeral 256-bit key is generated at startup and logged
//! exactly once — the operator copies it from the log. Identity, health,
//! and metrics endpoints are exempt.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::RngCore;

use uiforge_core::config::AuthConfig;
use uiforge_core::error::ErrorCode;

use crate::error::ApiError;
use crate::state::{bearer_token, AppState};

/// Paths that never require a credential.
const EXEMPT: [&str; 3] = ["/", "/health", "/metrics"];

/// Resolve the allowed key set from configuration.
///
/// With auth required and no keys configured, generates one ephemeral key
/// and logs it — once, at startup, never again.
pub fn resolve_api_keys(config: &AuthConfig) -> HashSet<String> {
    let mut keys: HashSet<String> = config
        .api_keys
        .iter()
        .filter(|k| !k.is_empty())
        .cloned()
        .collect();

    if config.require_api_key && keys.is_empty() {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let key = hex::encode(bytes);
        tracing::warn!(
            api_key = %key,
            "auth required but no API keys configured; generated an ephemeral key (valid until restart)",
        );
        keys.insert(key);
    }

    keys
}

/// Axum middleware enforcing bearer-key authentication.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if !state.config.auth.require_api_key || EXEMPT.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()) else {
        state.metrics.record_error(ErrorCode::MissingCredential).await;
        return ApiError::new(
            ErrorCode::MissingCredential,
            "missing bearer credential",
            path,
        )
        .into_response();
    };

    if !state.api_keys.contains(token) {
        state.metrics.record_error(ErrorCode::InvalidCredential).await;
        return ApiError::new(
            ErrorCode::InvalidCredential,
            "invalid bearer credential",
            path,
        )
        .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_keys_pass_through() {
        let keys = resolve_api_keys(&AuthConfig {
            require_api_key: true,
            api_keys: vec!["k1".into(), "k2".into()],
        });
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("k1"));
    }

    #[test]
    fn ephemeral_key_generated_when_required_and_empty() {
        let keys = resolve_api_keys(&AuthConfig {
            require_api_key: true,
            api_keys: vec![],
        });
        assert_eq!(keys.len(), 1);
        let key = keys.iter().next().unwrap();
        assert_eq!(key.len(), 64); // 32 bytes hex-encoded
    }

    #[test]
    fn no_key_generated_when_auth_disabled() {
        let keys = resolve_api_keys(&AuthConfig {
            require_api_key: false,
            api_keys: vec![],
        });
        assert!(keys.is_empty());
    }

    #[test]
    fn empty_strings_are_not_keys() {
        let keys = resolve_api_keys(&AuthConfig {
            require_api_key: false,
            api_keys: vec![String::new()],
        });
        assert!(keys.is_empty());
    }
}
