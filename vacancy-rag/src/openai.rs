//! Answer generation through the OpenAI chat completions API.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::generation::AnswerGenerator;

/// The default OpenAI chat completions endpoint.
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// The default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const PROVIDER: &str = "OpenAI";

/// Settings for [`OpenAIGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    /// Defaults to the public API; override for OpenAI-compatible servers.
    pub endpoint: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            endpoint: OPENAI_CHAT_URL.into(),
            temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// An [`AnswerGenerator`] backed by `/v1/chat/completions`.
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_rag::openai::OpenAIGenerator;
///
/// let generator = OpenAIGenerator::from_env()?;
/// let answer = generator.generate(system, user).await?;
/// ```
pub struct OpenAIGenerator {
    client: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAIGenerator {
    /// Create a generator from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Generation`] if the API key is empty or the HTTP
    /// client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RagError::Generation {
                provider: PROVIDER.into(),
                message: "API key must not be empty".into(),
            });
        }
        let client = reqwest::Client::builder().timeout(config.timeout).build().map_err(|e| {
            RagError::Generation { provider: PROVIDER.into(), message: e.to_string() }
        })?;
        Ok(Self { client, config })
    }

    /// Create a generator using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::Generation {
            provider: PROVIDER.into(),
            message: "OPENAI_API_KEY environment variable not set".into(),
        })?;
        Self::new(OpenAIConfig::new(api_key))
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Extract `choices[0].message.content` from a chat completion response.
fn parse_chat_response(body: &Value) -> Result<String> {
    body.pointer("/choices/0/message/content").and_then(Value::as_str).map(str::to_string).ok_or_else(
        || {
            let mut snippet = body.to_string();
            snippet.truncate(snippet.char_indices().nth(200).map_or(snippet.len(), |(i, _)| i));
            RagError::Generation {
                provider: PROVIDER.into(),
                message: format!("unexpected response format: {snippet}"),
            }
        },
    )
}

// ── AnswerGenerator implementation ─────────────────────────────────

#[async_trait]
impl AnswerGenerator for OpenAIGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.config.model, "requesting chat completion");

        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::Generation {
                    provider: PROVIDER.into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::Generation {
                provider: PROVIDER.into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::Generation {
                provider: PROVIDER.into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        parse_chat_response(&body)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_first_choice() {
        let body = json!({
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Три вакансии"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        });
        assert_eq!(parse_chat_response(&body).unwrap(), "Три вакансии");
    }

    #[test]
    fn rejects_empty_choices() {
        let err = parse_chat_response(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, RagError::Generation { .. }));
    }

    #[test]
    fn rejects_empty_api_key() {
        assert!(OpenAIGenerator::new(OpenAIConfig::new("")).is_err());
    }

    #[test]
    fn config_defaults() {
        let config = OpenAIConfig::new("sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.endpoint, OPENAI_CHAT_URL);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
