//! Environment variable overrides for configuration.

use std::env;

use super::Config;
use crate::error::ConfigError;

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// These are the deployment-facing names; each maps onto one nested
    /// config field.
    pub(super) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // LLM
        if let Ok(val) = env::var("OPENAI_API_KEY") {
            self.llm.api_key = val;
        }
        if let Ok(val) = env::var("OPENAI_BASE_URL") {
            self.llm.base_url = val;
        }
        if let Ok(val) = env::var("MODEL_NAME") {
            self.llm.model = val;
        }
        if let Ok(val) = env::var("MAX_TOKENS") {
            self.llm.max_tokens = parse_env_u32("MAX_TOKENS", &val)?;
        }
        if let Ok(val) = env::var("TEMPERATURE") {
            self.llm.temperature = parse_env_f32("TEMPERATURE", &val)?;
        }
        if let Ok(val) = env::var("STAGE_TIMEOUT_SECONDS") {
            self.llm.stage_timeout_secs = parse_env_u64("STAGE_TIMEOUT_SECONDS", &val)?;
        }

        // Server
        if let Ok(val) = env::var("HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("PORT") {
            self.server.port = parse_env_u16("PORT", &val)?;
        }
        if let Ok(val) = env::var("DEBUG") {
            self.server.debug = parse_env_bool("DEBUG", &val)?;
        }

        // Limits
        if let Ok(val) = env::var("MAX_FILE_SIZE") {
            self.limits.max_image_bytes = parse_env_u64("MAX_FILE_SIZE", &val)? as usize;
        }
        if let Ok(val) = env::var("RATE_LIMIT_ENABLED") {
            self.limits.rate_limit_enabled = parse_env_bool("RATE_LIMIT_ENABLED", &val)?;
        }
        if let Ok(val) = env::var("RATE_LIMIT_PER_MINUTE") {
            self.limits.rate_limit_per_minute = parse_env_u32("RATE_LIMIT_PER_MINUTE", &val)?;
        }

        // Cache
        if let Ok(val) = env::var("CACHE_ENABLED") {
            self.cache.enabled = parse_env_bool("CACHE_ENABLED", &val)?;
        }
        if let Ok(val) = env::var("CACHE_TTL_SECONDS") {
            self.cache.ttl_secs = parse_env_u64("CACHE_TTL_SECONDS", &val)?;
        }
        if let Ok(val) = env::var("CACHE_MAX_SIZE") {
            self.cache.max_size = parse_env_u64("CACHE_MAX_SIZE", &val)? as usize;
        }

        // Auth
        if let Ok(val) = env::var("REQUIRE_API_KEY") {
            self.auth.require_api_key = parse_env_bool("REQUIRE_API_KEY", &val)?;
        }
        if let Ok(val) = env::var("API_KEYS") {
            self.auth.api_keys = split_csv(&val);
        }

        // Vector store
        if let Ok(val) = env::var("PINECONE_API_KEY") {
            self.vector.api_key = val;
        }
        if let Ok(val) = env::var("PINECONE_INDEX_HOST") {
            self.vector.index_host = val;
        }
        if let Ok(val) = env::var("PINECONE_NAMESPACE") {
            self.vector.namespace = val;
        }

        Ok(())
    }
}

fn split_csv(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_env_u16(name: &str, val: &str) -> Result<u16, ConfigError> {
    val.parse().map_err(|_| ConfigError::InvalidValue {
        field: name.to_string(),
        message: format!("'{val}' is not a valid u16"),
    })
}

fn parse_env_u32(name: &str, val: &str) -> Result<u32, ConfigError> {
    val.parse().map_err(|_| ConfigError::InvalidValue {
        field: name.to_string(),
        message: format!("'{val}' is not a valid u32"),
    })
}

fn parse_env_u64(name: &str, val: &str) -> Result<u64, ConfigError> {
    val.parse().map_err(|_| ConfigError::InvalidValue {
        field: name.to_string(),
        message: format!("'{val}' is not a valid u64"),
    })
}

fn parse_env_f32(name: &str, val: &str) -> Result<f32, ConfigError> {
    val.parse().map_err(|_| ConfigError::InvalidValue {
        field: name.to_string(),
        message: format!("'{val}' is not a valid float"),
    })
}

fn parse_env_bool(name: &str, val: &str) -> Result<bool, ConfigError> {
    match val.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: name.to_string(),
            message: format!("'{val}' is not a valid boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_empties() {
        assert_eq!(split_csv("a, b ,,c"), vec!["a", "b", "c"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_env_bool("X", "true").unwrap());
        assert!(parse_env_bool("X", "1").unwrap());
        assert!(parse_env_bool("X", "ON").unwrap());
        assert!(!parse_env_bool("X", "false").unwrap());
        assert!(!parse_env_bool("X", "0").unwrap());
        assert!(parse_env_bool("X", "maybe").is_err());
    }

    #[test]
    fn parse_numeric_rejects_garbage() {
        assert!(parse_env_u16("PORT", "80000").is_err());
        assert!(parse_env_u32("N", "-1").is_err());
        assert!(parse_env_f32("T", "warm").is_err());
    }
}
