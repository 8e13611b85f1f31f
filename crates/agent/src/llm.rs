use std::time::Duration;

use async_trait::async_trait;
use dealwise_core::config::{LlmConfig, LlmProvider};
use dealwise_core::errors::ApplicationError;
use thiserror::Error;

use crate::anthropic::{AnthropicClient, ANTHROPIC_BASE_URL};
use crate::openai::{ChatCompletionClient, OLLAMA_BASE_URL, OPENAI_BASE_URL};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing credential: {0}")]
    MissingCredential(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("LLM returned empty content")]
    EmptyContent,
}

impl From<LlmError> for ApplicationError {
    fn from(value: LlmError) -> Self {
        match value {
            LlmError::MissingCredential(message) => Self::MissingCredential(message),
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Builds the client for the configured provider. Providers that need an API key
/// fail with `MissingCredential` when none is configured.
pub fn build_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>, LlmError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let api_key = config.api_key.clone();
    if config.provider.requires_api_key() && api_key.is_none() {
        return Err(LlmError::MissingCredential(format!(
            "llm.api_key is not set for provider `{}`",
            config.provider.as_str()
        )));
    }

    let client: Box<dyn LlmClient> = match config.provider {
        LlmProvider::OpenAi => Box::new(ChatCompletionClient::new(
            config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL),
            api_key,
            &config.model,
            config.max_tokens,
            timeout,
        )?),
        LlmProvider::Ollama => Box::new(ChatCompletionClient::new(
            config.base_url.as_deref().unwrap_or(OLLAMA_BASE_URL),
            api_key,
            &config.model,
            config.max_tokens,
            timeout,
        )?),
        LlmProvider::Anthropic => match api_key {
            Some(api_key) => Box::new(AnthropicClient::new(
                config.base_url.as_deref().unwrap_or(ANTHROPIC_BASE_URL),
                api_key,
                &config.model,
                config.max_tokens,
                timeout,
            )?),
            None => {
                return Err(LlmError::MissingCredential(
                    "llm.api_key is not set for provider `anthropic`".to_string(),
                ))
            }
        },
    };
    Ok(client)
}
