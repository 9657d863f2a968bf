//! Article text generation over an OpenAI-compatible chat-completions API.
//!
//! The pipeline only depends on the [`ContentGenerator`] trait; the
//! [`OpenAiGenerator`] is the production implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use autopress_shared::{AutopressError, GeneratorSettings, Result};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("autopress/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 500;

/// Produces article text for a topic.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate an article for `topic` following `instruction`.
    async fn generate(&self, topic: &str, instruction: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Instruction message. Newer OpenAI models take the `developer` role
    /// where older ones used `system`.
    pub fn developer(content: impl Into<String>) -> Self {
        Self {
            role: "developer".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// OpenAiGenerator
// ---------------------------------------------------------------------------

/// [`ContentGenerator`] backed by `POST {api_base}/chat/completions`.
pub struct OpenAiGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    /// Build a generator from resolved settings.
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AutopressError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.api_base),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    #[instrument(skip_all, fields(topic = %topic, model = %self.model))]
    async fn generate(&self, topic: &str, instruction: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::developer(instruction), ChatMessage::user(topic)],
        };

        debug!(endpoint = %self.endpoint, "requesting article");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AutopressError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or_else(|_| truncate(&body, MAX_ERROR_BODY));
            return Err(AutopressError::Generation(format!("HTTP {status}: {message}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AutopressError::parse(format!("invalid chat completion response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AutopressError::Generation("response contained no article text".into()))?;

        info!(chars = text.len(), "AI response received");
        Ok(text)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> OpenAiGenerator {
        OpenAiGenerator::new(&GeneratorSettings {
            api_base: server.uri(),
            api_key: "sk-test".into(),
            model: "gpt-test".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_developer_and_user_messages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-test",
                "messages": [
                    {"role": "developer", "content": "Be brief."},
                    {"role": "user", "content": "Cold brew"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "Cold Brew at Home\nSteep overnight."}},
                    {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = generator(&server)
            .generate("Cold brew", "Be brief.")
            .await
            .unwrap();
        assert_eq!(text, "Cold Brew at Home\nSteep overnight.");
    }

    #[tokio::test]
    async fn api_error_message_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit reached", "type": "requests"}
            })))
            .mount(&server)
            .await;

        let err = generator(&server).generate("topic", "rules").await.unwrap_err();
        assert!(matches!(err, AutopressError::Generation(_)));
        assert!(err.to_string().contains("Rate limit reached"));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn empty_choices_is_generation_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = generator(&server).generate("topic", "rules").await.unwrap_err();
        assert!(err.to_string().contains("no article text"));
    }

    #[test]
    fn truncate_long_error_bodies() {
        assert_eq!(truncate("short", 10), "short");
        let long = "x".repeat(20);
        assert_eq!(truncate(&long, 5), "xxxxx…");
    }
}
