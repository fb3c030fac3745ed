//! Provider configuration
//!
//! [`ProviderConfig`] describes how to reach an OpenAI-compatible completion
//! endpoint. Hosts usually build it with [`ProviderConfig::from_env`].

use serde::{Deserialize, Serialize};

/// Default values for provider configuration
pub mod defaults {
    /// Base URL of the OpenAI API
    pub const BASE_URL: &str = "https://api.openai.com/v1";
    /// Completion model
    pub const MODEL: &str = "o4-mini";
    /// Request timeout
    pub const TIMEOUT_SECS: u64 = 60;
    /// Sampling temperature used when the input omits one
    pub const TEMPERATURE: f64 = 0.7;
    /// System prompt used when the input omits one
    pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
}

/// Environment variable names read by [`ProviderConfig::from_env`]
pub mod env_vars {
    pub const API_KEY: &str = "OPENAI_API_KEY";
    pub const BASE_URL: &str = "NODEFLOW_PROVIDER_URL";
    pub const MODEL: &str = "NODEFLOW_MODEL";
}

/// Connection settings for a completion provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Base URL; `/chat/completions` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token; requests fail with `NotConfigured` without one
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    defaults::BASE_URL.to_string()
}

fn default_model() -> String {
    defaults::MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    defaults::TIMEOUT_SECS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a variable lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            base_url: non_empty(env_vars::BASE_URL).unwrap_or_else(default_base_url),
            model: non_empty(env_vars::MODEL).unwrap_or_else(default_model),
            api_key: non_empty(env_vars::API_KEY),
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full URL of the chat completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// The API key never appears in logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
