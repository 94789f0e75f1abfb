//! Text-completion capability
//!
//! The evolution cycle only ever needs "send one prompt, get text back".
//! [`CompletionModel`] is that seam; [`ChatClient`] implements it against any
//! OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Outcome of a single completion request.
///
/// Transport failures and null/blank content both collapse into `Empty`;
/// callers pattern-match instead of probing for a content field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Success(String),
    Empty,
}

impl CompletionResult {
    /// Build from optional text, treating blank text as `Empty`.
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(t) if !t.trim().is_empty() => Self::Success(t),
            _ => Self::Empty,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Success(t) => Some(t),
            Self::Empty => None,
        }
    }

    /// The text, or an empty string for `Empty`.
    pub fn into_string(self) -> String {
        self.into_text().unwrap_or_default()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Anything that turns a prompt into text. Must tolerate concurrent calls.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> CompletionResult;
}

/// OpenAI-compatible chat completion client
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<Arc<String>>,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("greenrank/0.1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            temperature,
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::new),
        })
    }

    /// Resolve the chat completions endpoint from the base URL.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Send a single user message and return `choices[0].message.content`.
    pub async fn chat(&self, prompt: &str) -> Result<Option<String>, CompletionError> {
        let body = serde_json::json!({
            "model": &self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": MAX_TOKENS,
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        Ok(parsed.into_content())
    }
}

#[async_trait]
impl CompletionModel for ChatClient {
    async fn complete(&self, prompt: &str) -> CompletionResult {
        match self.chat(prompt).await {
            Ok(content) => {
                let result = CompletionResult::from_text(content);
                if !result.is_success() {
                    debug!("Completion returned no content ({} prompt chars)", prompt.len());
                }
                result
            }
            Err(e) => {
                warn!("Completion request failed: {}", e);
                CompletionResult::Empty
            }
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ChatClient {
        ChatClient::new(base, Some("secret".to_string()), "test-model", 0.7).unwrap()
    }

    #[test]
    fn test_endpoint_resolution() {
        assert_eq!(
            client("http://localhost:8080/v1").endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            client("http://localhost:8080/v1/").endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            client("http://localhost:8080").endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            client("https://api.example.com/v1/chat/completions").endpoint(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", client("http://localhost:8080/v1"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_from_text_blank_is_empty() {
        assert_eq!(CompletionResult::from_text(None), CompletionResult::Empty);
        assert_eq!(
            CompletionResult::from_text(Some("  \n".to_string())),
            CompletionResult::Empty
        );
        assert_eq!(
            CompletionResult::from_text(Some("ok".to_string())),
            CompletionResult::Success("ok".to_string())
        );
        assert_eq!(CompletionResult::Empty.into_string(), "");
    }

    #[test]
    fn test_parse_null_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_content(), None);

        let json =
            r#"{"choices":[{"message":{"role":"assistant","content":"1. Bamboo Toothbrush"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_content().as_deref(), Some("1. Bamboo Toothbrush"));
    }

    #[test]
    fn test_request_error_is_empty() {
        // Fails while building the request, before any socket is opened.
        let client = client("not a url");
        assert!(matches!(
            tokio_test::block_on(client.chat("hello")),
            Err(CompletionError::Request(_))
        ));
        assert_eq!(
            tokio_test::block_on(client.complete("hello")),
            CompletionResult::Empty
        );
    }

    #[test]
    fn test_unreachable_endpoint_is_empty() {
        let mut client = client("http://127.0.0.1:9/v1");
        client.client = reqwest::Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let result = tokio_test::block_on(client.complete("hello"));
        assert_eq!(result, CompletionResult::Empty);
    }
}
