//! Answer generation through a local Ollama server's chat endpoint.
//!
//! This module is only available when the `ollama` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::generation::AnswerGenerator;

/// The default Ollama server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default chat model.
pub const DEFAULT_MODEL: &str = "qwen2.5:3b";

const PROVIDER: &str = "Ollama";

/// Connection settings for [`OllamaGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Local models can be slow on CPU; the default allows five minutes.
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout: Duration::from_secs(300),
        }
    }
}

impl OllamaConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// An [`AnswerGenerator`] calling `POST {base_url}/api/chat` without streaming.
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_rag::ollama::{OllamaConfig, OllamaGenerator};
///
/// let generator = OllamaGenerator::new(OllamaConfig::default().with_model("llama3.1:8b"))?;
/// ```
pub struct OllamaGenerator {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaGenerator {
    /// Create a generator for the given server and model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Generation`] if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build().map_err(|e| {
            RagError::Generation { provider: PROVIDER.into(), message: e.to_string() }
        })?;
        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

/// Extract `message.content` from an Ollama chat response.
fn parse_chat_response(body: &Value) -> Result<String> {
    body.pointer("/message/content").and_then(Value::as_str).map(str::to_string).ok_or_else(|| {
        let mut snippet = body.to_string();
        snippet.truncate(snippet.char_indices().nth(200).map_or(snippet.len(), |(i, _)| i));
        RagError::Generation {
            provider: PROVIDER.into(),
            message: format!("unexpected response format: {snippet}"),
        }
    })
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.config.model, "requesting chat completion");

        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            stream: false,
        };

        let response =
            self.client.post(self.chat_url()).json(&request).send().await.map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::Generation { provider: PROVIDER.into(), message: format!("request failed: {e}") }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::Generation {
                provider: PROVIDER.into(),
                message: format!("API returned {status}: {body}"),
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
    fn extracts_message_content() {
        let body = json!({"model": "qwen2.5:3b", "message": {"role": "assistant", "content": "Ответ"}});
        assert_eq!(parse_chat_response(&body).unwrap(), "Ответ");
    }

    #[test]
    fn rejects_missing_message() {
        let err = parse_chat_response(&json!({"error": "model not found"})).unwrap_err();
        assert!(matches!(err, RagError::Generation { .. }));
        assert!(err.to_string().contains("unexpected response format"));
    }

    #[test]
    fn request_serializes_as_non_streaming_chat() {
        let request = ChatRequest {
            model: "m",
            messages: [
                ChatMessage { role: "system", content: "s" },
                ChatMessage { role: "user", content: "u" },
            ],
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], json!(false));
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "u");
    }

    #[test]
    fn chat_url_tolerates_trailing_slash() {
        let generator =
            OllamaGenerator::new(OllamaConfig::default().with_base_url("http://host:1/")).unwrap();
        assert_eq!(generator.chat_url(), "http://host:1/api/chat");
    }
}
