//! Configuration validation.

use super::Config;
use crate::error::ConfigError;

impl Config {
    /// Validate the loaded configuration before the service starts.
    ///
    /// Catches misconfiguration at startup rather than on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "llm.api_key".to_string(),
            });
        }

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: "must be between 0.0 and 2.0".to_string(),
            });
        }

        if self.llm.stage_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.stage_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "must be non-zero".to_string(),
            });
        }

        if self.limits.max_image_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "limits.max_image_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.limits.rate_limit_enabled && self.limits.rate_limit_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: "limits.rate_limit_per_minute".to_string(),
                message: "must be greater than zero when rate limiting is enabled".to_string(),
            });
        }

        if self.cache.enabled && self.cache.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_size".to_string(),
                message: "must be greater than zero when the cache is enabled".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.llm.api_key = "sk-test".to_string();
        config
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn missing_api_key_fails() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field } if field == "llm.api_key"));
    }

    #[test]
    fn out_of_range_temperature_fails() {
        let mut config = valid_config();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_port_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_rate_limit_ok_when_disabled() {
        let mut config = valid_config();
        config.limits.rate_limit_enabled = false;
        config.limits.rate_limit_per_minute = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_cache_size_fails_when_enabled() {
        let mut config = valid_config();
        config.cache.max_size = 0;
        assert!(config.validate().is_err());
    }
}
