//! Configuration management for uiforge.
//!
//! Supports three-layer configuration loading:
//! 1. Built-in defaults
//! 2. TOML config file (`~/.uiforge/config.toml`)
//! 3. Environment variable overrides (the deployment surface)
//!
//! CLI flag overrides are applied by the binary crate after loading.

mod defaults;
mod env_overrides;
mod validation;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for the uiforge service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Upstream LLM settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP bind settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Request limits (image size, rate limiting).
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// API-key authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Optional vector-store settings.
    #[serde(default)]
    pub vector: VectorConfig,
}

/// Upstream LLM provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Credential for the upstream chat completion API.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible endpoint.
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "defaults::model_name")]
    pub model: String,

    /// Default per-call output token cap.
    #[serde(default = "defaults::max_tokens")]
    pub max_tokens: u32,

    /// Default sampling temperature.
    #[serde(default = "defaults::temperature")]
    pub temperature: f32,

    /// Per-stage call timeout in seconds.
    #[serde(default = "defaults::stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: defaults::base_url(),
            model: defaults::model_name(),
            max_tokens: defaults::max_tokens(),
            temperature: defaults::temperature(),
            stage_timeout_secs: defaults::stage_timeout_secs(),
        }
    }
}

/// HTTP bind configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "defaults::host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Debug mode: error responses include internal detail.
    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            debug: false,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Maximum decoded image size in bytes.
    #[serde(default = "defaults::max_image_bytes")]
    pub max_image_bytes: usize,

    /// Whether rate limiting is enforced.
    #[serde(default = "defaults::enabled")]
    pub rate_limit_enabled: bool,

    /// Generation-endpoint budget in requests per minute.
    #[serde(default = "defaults::rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// Health/operational-endpoint budget in requests per minute.
    #[serde(default = "defaults::health_rate_limit_per_minute")]
    pub health_rate_limit_per_minute: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: defaults::max_image_bytes(),
            rate_limit_enabled: defaults::enabled(),
            rate_limit_per_minute: defaults::rate_limit_per_minute(),
            health_rate_limit_per_minute: defaults::health_rate_limit_per_minute(),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Whether completed generations are memoized.
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Entry time-to-live in seconds.
    #[serde(default = "defaults::cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of entries before LRU eviction.
    #[serde(default = "defaults::cache_max_size")]
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            ttl_secs: defaults::cache_ttl_secs(),
            max_size: defaults::cache_max_size(),
        }
    }
}

/// API-key authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Whether requests must present a bearer key.
    #[serde(default)]
    pub require_api_key: bool,

    /// The allowed key set. When auth is required and this is empty, the
    /// server generates one ephemeral key at startup and logs it once.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

/// Optional vector-store (Pinecone) configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VectorConfig {
    /// Pinecone API key; empty disables the feature.
    #[serde(default)]
    pub api_key: String,

    /// Index host URL, e.g. `https://myindex-abc123.svc.pinecone.io`.
    #[serde(default)]
    pub index_host: String,

    /// Namespace generations are archived under.
    #[serde(default)]
    pub namespace: String,
}

impl VectorConfig {
    /// Whether the vector-store feature is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.index_host.is_empty()
    }
}

impl Config {
    /// Default config file path (`~/.uiforge/config.toml`).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".uiforge")
            .join("config.toml")
    }

    /// Load configuration: defaults, then the TOML file if it exists, then
    /// environment overrides. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                message: e.to_string(),
            })?;
            toml::from_str(&raw).map_err(|source| ConfigError::ParseError { source })?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, 4096);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.llm.stage_timeout_secs, 60);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert!(!config.server.debug);
        assert_eq!(config.limits.max_image_bytes, 5_242_880);
        assert!(config.limits.rate_limit_enabled);
        assert_eq!(config.limits.rate_limit_per_minute, 5);
        assert_eq!(config.limits.health_rate_limit_per_minute, 60);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.cache.max_size, 100);
        assert!(!config.auth.require_api_key);
        assert!(config.auth.api_keys.is_empty());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [llm]
            api_key = "sk-test"
            model = "gpt-4o-mini"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nmax_size = 7\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.cache.max_size, 7);
    }

    #[test]
    fn vector_config_requires_key_and_host() {
        let mut v = VectorConfig::default();
        assert!(!v.is_configured());
        v.api_key = "pk".into();
        assert!(!v.is_configured());
        v.index_host = "https://idx.svc.pinecone.io".into();
        assert!(v.is_configured());
    }
}
