//! OpenAI Chat Completions provider.
//!
//! Talks to any endpoint implementing `/v1/chat/completions`, authenticated
//! with a bearer key.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::LlmConfig;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};

const PROVIDER_NAME: &str = "openai";

/// OpenAI-compatible Chat Completions provider.
pub struct OpenAiProvider {
    client: Client,
    config: LlmConfig,
}

impl OpenAiProvider {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("Failed to build reqwest client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    /// Strips a trailing `/v1` from the base URL so it is never doubled.
    fn api_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        format!("{}/v1/{}", base, path.trim_start_matches('/'))
    }

    async fn send_request(
        &self,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let url = self.api_url("chat/completions");
        tracing::debug!(url = %url, model = %body.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Chat completion request failed: {}", e);
                LlmError::RequestFailed {
                    provider: PROVIDER_NAME.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(std::time::Duration::from_secs);
        let text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => LlmError::AuthFailed {
                    provider: PROVIDER_NAME.to_string(),
                },
                429 => LlmError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                    retry_after,
                },
                _ => LlmError::RequestFailed {
                    provider: PROVIDER_NAME.to_string(),
                    reason: format!("HTTP {}: {}", status, truncate(&text, 200)),
                },
            });
        }

        serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("JSON parse error: {}. Raw: {}", e, truncate(&text, 200)),
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        model_pricing(&self.config.model)
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let response = self.send_request(&body).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: "No choices in response".to_string(),
            })?;

        let usage = response.usage.unwrap_or_default();
        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
        })
    }
}

/// Per-token USD prices (input, output). Unknown models are priced at zero.
fn model_pricing(model: &str) -> (Decimal, Decimal) {
    match model {
        m if m.starts_with("gpt-3.5-turbo") => (dec!(0.0000005), dec!(0.0000015)),
        m if m.starts_with("gpt-4o-mini") => (dec!(0.00000015), dec!(0.0000006)),
        m if m.starts_with("gpt-4o") => (dec!(0.0000025), dec!(0.00001)),
        _ => (Decimal::ZERO, Decimal::ZERO),
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatCompletionUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> OpenAiProvider {
        OpenAiProvider::new(LlmConfig {
            api_key: secrecy::SecretString::from("sk-test"),
            base_url: base_url.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.9,
        })
        .unwrap()
    }

    #[test]
    fn api_url_appends_v1() {
        let p = provider("https://api.openai.com");
        assert_eq!(
            p.api_url("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn api_url_does_not_double_v1() {
        let p = provider("https://example.com/v1/");
        assert_eq!(
            p.api_url("/chat/completions"),
            "https://example.com/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_skips_unset_options() {
        let messages = vec![ChatMessage::user("hello")];
        let body = ChatCompletionRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            temperature: None,
            max_tokens: Some(50),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_tokens"], 50);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_parses_without_usage() {
        let raw = r#"{"choices":[{"message":{"content":"Why?"},"finish_reason":"stop"}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Why?"));
    }

    #[test]
    fn pricing_known_and_unknown_models() {
        assert!(model_pricing("gpt-3.5-turbo").0 > Decimal::ZERO);
        assert_eq!(model_pricing("local-llama"), (Decimal::ZERO, Decimal::ZERO));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
    }
}
