//! Text completion providers
//!
//! [`TextProvider`] is the seam between completion nodes and whatever model
//! backs them. [`OpenAiProvider`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use nodeflow_engine::ProviderError;
use serde::{Deserialize, Serialize};

use crate::config::{defaults, env_vars, ProviderConfig};

/// Sampling options for one completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    pub temperature: f64,
    pub system_prompt: String,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: defaults::TEMPERATURE,
            system_prompt: defaults::SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Generates text for a prompt
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Complete a prompt
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response structure from the chat completions API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible HTTP provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl OpenAiProvider {
    /// Create a provider with its own HTTP client
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create a provider using an existing HTTP client
    pub fn with_client(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl TextProvider for OpenAiProvider {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            log::warn!(
                "{} is not set; text completion requests will fail until it is provided",
                env_vars::API_KEY
            );
            return Err(ProviderError::NotConfigured(format!(
                "{} is not set",
                env_vars::API_KEY
            )));
        };

        let body = ChatRequest {
            model: &self.config.model,
            temperature: options.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &options.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let url = self.config.completions_url();
        log::debug!(
            "OpenAiProvider: sending request to {} with model '{}'",
            url,
            self.config.model
        );

        let http_response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Transport(format!("Failed to reach provider at {}: {}", url, e))
            })?;

        let status = http_response.status();
        if !status.is_success() {
            let error_body = http_response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), error_body));
        }

        let response: ChatResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        extract_completion(response)
    }
}

/// Map a non-success status to a provider error
fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::Quota(body),
        _ => ProviderError::Status {
            status,
            message: body,
        },
    }
}

fn extract_completion(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::InvalidResponse("response has no completion text".to_string()))
}
