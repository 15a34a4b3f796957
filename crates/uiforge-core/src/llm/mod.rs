//! LLM provider abstraction and implementations.
//!
//! Provides a trait-based abstraction over multimodal chat-completion
//! providers with typed responses, token usage tracking, retry/backoff, and
//! response-envelope recovery.

pub mod envelope;
pub mod factory;
pub mod openai;
pub mod pricing;

use crate::error::LlmError;
use crate::image::ImageAttachment;

/// Token usage information from an LLM completion.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the input/prompt.
    pub input_tokens: u32,
    /// Number of tokens in the output/completion.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Accumulate token counts from another usage record (e.g. across stages).
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Response from an LLM completion request.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,
    /// Token usage for this completion.
    pub usage: TokenUsage,
    /// The model that produced this response.
    pub model: String,
}

/// Parameters controlling LLM generation behavior.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 = deterministic, 1.0+ = creative).
    pub temperature: f32,
    /// Per-call timeout in seconds; the stage fails transiently on expiry.
    pub timeout_secs: u64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

/// Trait abstracting all multimodal LLM provider operations.
///
/// The trait is object-safe for use as `Arc<dyn LlmProvider>`; the pipeline
/// engine and the HTTP surface only ever see this interface.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the display name of this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request, optionally attaching a mockup image.
    ///
    /// Implementations retry transient failures internally (up to 3 attempts
    /// with exponential backoff) and fail fast on permanent ones.
    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        image: Option<&ImageAttachment>,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError>;

    /// Check if the provider is reachable and configured correctly.
    async fn health_check(&self) -> Result<(), LlmError>;
}
