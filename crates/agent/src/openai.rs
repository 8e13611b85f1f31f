//! OpenAI-compatible chat completions. Ollama serves the same API under `/v1`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::{LlmClient, LlmError};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if it carries any text.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .filter(|content| !content.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    max_tokens: u32,
}

impl ChatCompletionClient {
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        model: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            max_tokens,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let mut request = self.client.post(self.endpoint()).json(&self.request_body(prompt));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            warn!(
                event_name = "llm.chat_completion.failed",
                status = status.as_u16(),
                model = %self.model,
                "chat completion returned an error status"
            );
            return Err(LlmError::Api { status: status.as_u16(), message });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion.first_content().ok_or(LlmError::EmptyContent)?.to_string();
        debug!(
            event_name = "llm.chat_completion.succeeded",
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat completion succeeded"
        );
        Ok(content)
    }
}
