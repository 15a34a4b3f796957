//! Provider construction from configuration.

use std::sync::Arc;

use super::openai::OpenAiProvider;
use super::LlmProvider;
use crate::config::LlmConfig;
use crate::error::LlmError;

/// Build the configured LLM provider.
///
/// Fails with [`LlmError::NotConfigured`] when no credential is present, so
/// startup surfaces the problem before the first request does.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    if config.api_key.is_empty() {
        return Err(LlmError::NotConfigured);
    }

    Ok(Arc::new(OpenAiProvider::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.model.clone(),
    )))
}
