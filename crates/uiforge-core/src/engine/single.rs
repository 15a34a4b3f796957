//! The single-stage generation path.
//!
//! One composite LLM call with the same response parsing, validation, and
//! merging rules as the chained pipeline. Intended for prototypes; the
//! chained path produces larger, more complete projects.

use std::sync::Arc;

use super::{GenerationRequest, GenerationResponse, ResponseAccumulator};
use crate::error::GenerationError;
use crate::llm::envelope::Envelope;
use crate::llm::{GenerationParams, LlmProvider, TokenUsage};
use crate::prompt::{self, PromptOptions};
use crate::validate::{self, ValidationReport};

/// Everything a completed single-stage run produced.
#[derive(Debug)]
pub struct SingleOutcome {
    /// The response.
    pub response: GenerationResponse,
    /// Token usage for the one call.
    pub usage: TokenUsage,
    /// The syntax validation report.
    pub validation: ValidationReport,
    /// The model that served the call.
    pub model: String,
}

/// Run one composite generation call.
///
/// When `custom_prompt` is present it replaces the assembled system prompt
/// wholesale (and the caller has already bypassed the cache).
pub async fn run_single(
    provider: &Arc<dyn LlmProvider>,
    request: &GenerationRequest,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
) -> Result<SingleOutcome, GenerationError> {
    let system = match &request.custom_prompt {
        Some(custom) => custom.clone(),
        None => prompt::build_system(
            &request.stack,
            &request.project_name,
            "web application",
            PromptOptions::full_featured(),
        ),
    };
    let user = prompt::build_user(&request.description, &request.stack, &[], true);

    let params = GenerationParams {
        max_tokens,
        temperature,
        timeout_secs,
    };

    let response = provider
        .complete(&system, &user, request.image.as_ref(), &params)
        .await?;

    let envelope = Envelope::from_text(&response.text).map_err(GenerationError::Llm)?;
    if envelope.files.is_empty() {
        return Err(GenerationError::NoOutput);
    }

    let mut acc = ResponseAccumulator::default();
    acc.absorb(envelope);

    let validation = validate::validate_files(acc.files());
    let advisories = validation.advisory().into_iter().collect();

    let message = format!("Generated {} files.", acc.file_count());
    let generated = acc.finish(true, message, advisories);

    Ok(SingleOutcome {
        response: generated,
        usage: response.usage,
        validation,
        model: response.model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::LlmResponse;
    use crate::stack::TechStack;
    use std::sync::Mutex;

    /// Provider that records the prompts it was handed.
    struct RecordingProvider {
        reply: String,
        seen_system: Mutex<Option<String>>,
    }

    impl RecordingProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen_system: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            system: &str,
            _user: &str,
            _image: Option<&crate::image::ImageAttachment>,
            _params: &GenerationParams,
        ) -> Result<LlmResponse, LlmError> {
            *self.seen_system.lock().unwrap() = Some(system.to_string());
            Ok(LlmResponse {
                text: self.reply.clone(),
                usage: TokenUsage {
                    input_tokens: 500,
                    output_tokens: 1000,
                },
                model: "gpt-4o".to_string(),
            })
        }

        async fn health_check(&self) -> Result<(), LlmError> {
            Ok(())
        }
    }

    fn request(custom_prompt: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            image: None,
            description: "a weather dashboard".to_string(),
            stack: TechStack::parse("react", "express", "mongodb", None).unwrap(),
            project_name: "weather-dash".to_string(),
            custom_prompt: custom_prompt.map(String::from),
        }
    }

    fn files_reply() -> String {
        serde_json::json!({
            "files": [
                {"path": "src/main.tsx", "content": "// entry", "description": "entry"},
                {"path": "src/App.tsx", "content": "// app", "description": "shell"}
            ],
            "setup_instructions": ["npm install"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn single_stage_success() {
        let provider: Arc<dyn LlmProvider> = Arc::new(RecordingProvider::new(&files_reply()));
        let outcome = run_single(&provider, &request(None), 4096, 0.7, 60)
            .await
            .expect("run");

        assert!(outcome.response.success);
        assert_eq!(outcome.response.files.len(), 2);
        assert_eq!(outcome.usage.output_tokens, 1000);
        assert_eq!(outcome.model, "gpt-4o");
        assert_eq!(outcome.response.setup_instructions, vec!["npm install"]);
    }

    #[tokio::test]
    async fn custom_prompt_overrides_system() {
        let provider = Arc::new(RecordingProvider::new(&files_reply()));
        let as_dyn: Arc<dyn LlmProvider> = provider.clone();
        run_single(
            &as_dyn,
            &request(Some("You are a minimalist code generator.")),
            4096,
            0.7,
            60,
        )
        .await
        .expect("run");

        let seen = provider.seen_system.lock().unwrap().clone().unwrap();
        assert_eq!(seen, "You are a minimalist code generator.");
    }

    #[tokio::test]
    async fn assembled_prompt_carries_framework_block() {
        let provider = Arc::new(RecordingProvider::new(&files_reply()));
        let as_dyn: Arc<dyn LlmProvider> = provider.clone();
        run_single(&as_dyn, &request(None), 4096, 0.7, 60)
            .await
            .expect("run");

        let seen = provider.seen_system.lock().unwrap().clone().unwrap();
        assert!(seen.contains("=== FRAMEWORK REQUIREMENTS ==="));
        assert!(seen.contains("Express"));
    }

    #[tokio::test]
    async fn malformed_reply_is_upstream_error() {
        let provider: Arc<dyn LlmProvider> =
            Arc::new(RecordingProvider::new("no json here, friend"));
        let err = run_single(&provider, &request(None), 4096, 0.7, 60)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Llm(LlmError::Envelope(_))));
    }

    #[tokio::test]
    async fn empty_files_is_no_output() {
        let provider: Arc<dyn LlmProvider> =
            Arc::new(RecordingProvider::new(r#"{"files": []}"#));
        let err = run_single(&provider, &request(None), 4096, 0.7, 60)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoOutput));
    }
}
