//! OpenAI-compatible multimodal LLM provider.
//!
//! Speaks the chat completions API with image parts as `data:` URLs. Works
//! with OpenAI and any endpoint sharing the same request/response format.
//!
//! Retry policy: transient failures (429, 5xx, network, timeout, decode) are
//! retried up to 3 times with exponential backoff (2^n seconds); a rate
//! limit with a server-provided `retry-after` hint uses that hint instead.
//! Permanent failures (401/403 auth, quota exhaustion, 4xx rejections) fail
//! immediately with a typed error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{GenerationParams, LlmProvider, LlmResponse, TokenUsage};
use crate::error::LlmError;
use crate::image::ImageAttachment;

/// Maximum retry attempts after the initial call.
const MAX_RETRIES: u32 = 3;

/// An LLM provider using the OpenAI chat completions API format.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// One request/response round trip without retry handling.
    async fn attempt(
        &self,
        system: &str,
        user_message: &str,
        image: Option<&ImageAttachment>,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError> {
        let mut user_parts = vec![ContentPart::Text {
            text: user_message.to_string(),
        }];
        if let Some(img) = image {
            user_parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: img.as_data_url(),
                },
            });
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(system.to_string()),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(user_parts),
                },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let send = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send();

        let response = tokio::time::timeout(Duration::from_secs(params.timeout_secs), send)
            .await
            .map_err(|_| LlmError::Timeout {
                seconds: params.timeout_secs,
            })??;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, retry_after, body));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("failed to parse response: {e}")))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("response carried no choices".to_string()))?;

        let usage = body.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens.unwrap_or(0),
            output_tokens: u.completion_tokens.unwrap_or(0),
        });

        Ok(LlmResponse {
            text,
            usage,
            model: body.model,
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        image: Option<&ImageAttachment>,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError> {
        tracing::debug!(
            model = %self.model,
            max_tokens = params.max_tokens,
            has_image = image.is_some(),
            "LLM request",
        );

        let mut attempt_no = 0u32;
        loop {
            match self.attempt(system, user_message, image, params).await {
                Ok(resp) => {
                    tracing::debug!(
                        input_tokens = resp.usage.input_tokens,
                        output_tokens = resp.usage.output_tokens,
                        chars = resp.text.len(),
                        "LLM response",
                    );
                    return Ok(resp);
                }
                Err(err) if err.is_transient() && attempt_no < MAX_RETRIES => {
                    let wait = match &err {
                        LlmError::RateLimited { retry_after_secs } => *retry_after_secs,
                        _ => 2u64.pow(attempt_no),
                    };
                    attempt_no += 1;
                    tracing::warn!(
                        attempt = attempt_no,
                        wait_secs = wait,
                        error = %err,
                        "transient LLM failure, backing off",
                    );
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }
        self.complete(
            "You are a connectivity probe.",
            "Reply with OK.",
            None,
            &GenerationParams {
                max_tokens: 8,
                temperature: 0.0,
                timeout_secs: 15,
            },
        )
        .await?;
        Ok(())
    }
}

/// Map a non-success HTTP status onto a typed error.
fn classify_failure(status: u16, retry_after: Option<u64>, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::Auth { message: body },
        429 => {
            // OpenAI reports exhausted quota with the same status; the body
            // distinguishes a hard stop from a transient limit.
            if body.contains("insufficient_quota") || body.contains("billing") {
                LlmError::Quota { message: body }
            } else {
                LlmError::RateLimited {
                    retry_after_secs: retry_after.unwrap_or(60),
                }
            }
        }
        _ => LlmError::Api {
            status,
            message: body,
        },
    }
}

// --- Internal Serde types ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn provider(uri: String) -> OpenAiProvider {
        OpenAiProvider::new(uri, "test-key".into(), "gpt-4o".into())
    }

    fn ok_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"content": content}}],
            "model": "gpt-4o",
            "usage": {"prompt_tokens": 12, "completion_tokens": 4}
        })
    }

    #[tokio::test]
    async fn complete_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("{\"files\":[]}")))
            .mount(&server)
            .await;

        let resp = provider(server.uri())
            .complete("system", "user", None, &GenerationParams::default())
            .await
            .expect("complete");

        assert_eq!(resp.text, "{\"files\":[]}");
        assert_eq!(resp.model, "gpt-4o");
        assert_eq!(resp.usage.input_tokens, 12);
        assert_eq!(resp.usage.output_tokens, 4);
    }

    #[tokio::test]
    async fn image_is_sent_as_data_url_part() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    {"role": "system"},
                    {"role": "user", "content": [
                        {"type": "text"},
                        {"type": "image_url"}
                    ]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let png = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";
        let image = ImageAttachment::from_base64(png, 5_242_880).unwrap();

        provider(server.uri())
            .complete("system", "user", Some(&image), &GenerationParams::default())
            .await
            .expect("complete");
    }

    #[tokio::test]
    async fn rate_limit_retries_then_surfaces() {
        let server = MockServer::start().await;

        // retry-after 0 keeps the backoff sleeps instant in the test.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .append_header("retry-after", "0")
                    .set_body_string("rate limited"),
            )
            .expect(4) // initial call + 3 retries
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .complete("system", "user", None, &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn auth_failure_does_not_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .complete("system", "user", None, &GenerationParams::default())
            .await
            .unwrap_err();

        match err {
            LlmError::Auth { message } => assert!(message.contains("invalid api key")),
            other => panic!("expected Auth, got: {other}"),
        }
    }

    #[tokio::test]
    async fn quota_exhaustion_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_string("{\"error\":{\"code\":\"insufficient_quota\"}}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .complete("system", "user", None, &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Quota { .. }));
    }

    #[tokio::test]
    async fn server_error_retries_until_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(move |_: &Request| {
                use std::sync::atomic::{AtomicUsize, Ordering};
                static CALLS: AtomicUsize = AtomicUsize::new(0);
                if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(500).set_body_string("flaky")
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({
                        "choices": [{"message": {"content": "recovered"}}],
                        "model": "gpt-4o"
                    }))
                }
            })
            .mount(&server)
            .await;

        let resp = provider(server.uri())
            .complete("system", "user", None, &GenerationParams::default())
            .await
            .expect("complete after retry");

        assert_eq!(resp.text, "recovered");
    }

    #[tokio::test]
    async fn bad_request_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_string("malformed prompt"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .complete("system", "user", None, &GenerationParams::default())
            .await
            .unwrap_err();

        match err {
            LlmError::Api { status, .. } => assert_eq!(status, 400),
            other => panic!("expected Api, got: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_parse_error_after_retries() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": [], "model": "gpt-4o"})),
            )
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .complete("system", "user", None, &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[tokio::test]
    async fn health_check_requires_key() {
        let p = OpenAiProvider::new("http://localhost:9".into(), String::new(), "gpt-4o".into());
        let err = p.health_check().await.unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }
}
