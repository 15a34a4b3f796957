//! Shared application state for the uiforge server.
//!
//! Every service here is explicitly constructed at startup and injected into
//! handlers through `State<Arc<AppState>>`; nothing is an ambient singleton.

use std::collections::HashSet;
use std::time::Duration;

use axum::http::HeaderMap;

use uiforge_core::cache::ResponseCache;
use uiforge_core::config::Config;
use uiforge_core::llm::LlmProvider;
use uiforge_core::metrics::MetricsRegistry;
use uiforge_core::ratelimit::{RateClass, RateLimiter};
use uiforge_core::vector::PineconeClient;

use std::sync::Arc;

/// Shared application state accessible by all route handlers.
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// The upstream multimodal LLM provider.
    pub provider: Arc<dyn LlmProvider>,
    /// Fingerprinted response cache.
    pub cache: ResponseCache,
    /// Token-bucket rate limiter.
    pub limiter: RateLimiter,
    /// Process-wide metrics registry.
    pub metrics: MetricsRegistry,
    /// Optional vector-store client (None when unconfigured).
    pub vector: Option<PineconeClient>,
    /// Resolved allowed API keys (may contain one ephemeral startup key).
    pub api_keys: HashSet<String>,
}

impl AppState {
    /// Construct all services from configuration plus a provider.
    pub fn new(config: Config, provider: Arc<dyn LlmProvider>) -> Self {
        let cache = ResponseCache::new(
            config.cache.enabled,
            config.cache.max_size,
            Duration::from_secs(config.cache.ttl_secs),
        );
        let limiter = RateLimiter::new(config.limits.rate_limit_enabled);
        let vector = PineconeClient::from_config(&config.vector);
        let api_keys = crate::auth::resolve_api_keys(&config.auth);

        Self {
            config,
            provider,
            cache,
            limiter,
            metrics: MetricsRegistry::new(),
            vector,
            api_keys,
        }
    }

    /// The rate class for generation endpoints.
    pub fn generation_class(&self) -> RateClass {
        RateClass::per_minute("generation", self.config.limits.rate_limit_per_minute)
    }

    /// The rate class for health/operational endpoints.
    pub fn operational_class(&self) -> RateClass {
        RateClass::per_minute("operational", self.config.limits.health_rate_limit_per_minute)
    }

    /// Client identity for rate limiting: the API key when present,
    /// otherwise the forwarded source address, otherwise a shared bucket.
    pub fn client_identity(headers: &HeaderMap) -> String {
        if let Some(token) = bearer_token(headers) {
            return format!("key:{token}");
        }
        if let Some(addr) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
        {
            return format!("addr:{}", addr.trim());
        }
        "anonymous".to_string()
    }
}

/// Extract a bearer token from request headers.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn identity_prefers_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        assert_eq!(AppState::client_identity(&headers), "key:abc");
    }

    #[test]
    fn identity_falls_back_to_source_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 10.0.0.1"),
        );
        assert_eq!(AppState::client_identity(&headers), "addr:1.2.3.4");
    }

    #[test]
    fn identity_defaults_to_shared_bucket() {
        assert_eq!(AppState::client_identity(&HeaderMap::new()), "anonymous");
    }
}
