//! Text Completion Node
//!
//! Sends a prompt to a [`TextProvider`] and returns the completion.

use std::sync::Arc;

use async_trait::async_trait;
use nodeflow_engine::{FieldSchema, Node, NodeError, NodeKind, Schema, Typed, TypedNode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::defaults;
use crate::provider::{CompletionOptions, TextProvider};

/// Input of [`TextCompletionNode`], with defaults already applied
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextCompletionInput {
    pub prompt: String,
    pub temperature: f64,
    pub system_prompt: String,
}

/// Output of [`TextCompletionNode`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextCompletionOutput {
    pub completion: String,
}

/// Text Completion Node
///
/// # Inputs
/// - `prompt` (required) - The prompt to send
/// - `temperature` (optional, default 0.7) - Sampling temperature
/// - `systemPrompt` (optional) - System prompt for the model
///
/// # Outputs
/// - `completion` - The generated text
#[derive(Clone)]
pub struct TextCompletionNode {
    provider: Arc<dyn TextProvider>,
}

impl TextCompletionNode {
    /// Registered name
    pub const NAME: &'static str = "textCompletion";
    /// Port ID for prompt input
    pub const PORT_PROMPT: &'static str = "prompt";
    /// Port ID for temperature input
    pub const PORT_TEMPERATURE: &'static str = "temperature";
    /// Port ID for system prompt input
    pub const PORT_SYSTEM_PROMPT: &'static str = "systemPrompt";
    /// Port ID for completion output
    pub const PORT_COMPLETION: &'static str = "completion";

    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    /// Wrap under the registered name
    pub fn into_node(self) -> Arc<dyn Node> {
        self.named(Self::NAME)
    }

    /// Wrap under a custom name
    pub fn named(self, name: impl Into<String>) -> Arc<dyn Node> {
        Typed::new(name, self).into_node()
    }
}

#[async_trait]
impl TypedNode for TextCompletionNode {
    type Input = TextCompletionInput;
    type Output = TextCompletionOutput;
    const KIND: NodeKind = NodeKind::Io;

    fn input_schema(&self) -> Schema {
        Schema::record([
            FieldSchema::required(Self::PORT_PROMPT, Schema::String)
                .with_description("The prompt to send to the model"),
            FieldSchema::optional(Self::PORT_TEMPERATURE, Schema::Number)
                .with_default(json!(defaults::TEMPERATURE))
                .with_description("Sampling temperature between 0 and 1"),
            FieldSchema::optional(Self::PORT_SYSTEM_PROMPT, Schema::String)
                .with_default(json!(defaults::SYSTEM_PROMPT))
                .with_description("System prompt for the model"),
        ])
    }

    fn output_schema(&self) -> Schema {
        Schema::record([FieldSchema::required(Self::PORT_COMPLETION, Schema::String)
            .with_description("The generated completion text")])
    }

    async fn run(&self, input: TextCompletionInput) -> Result<TextCompletionOutput, NodeError> {
        let options = CompletionOptions {
            temperature: input.temperature,
            system_prompt: input.system_prompt,
        };
        let completion = self.provider.complete(&input.prompt, &options).await?;
        Ok(TextCompletionOutput { completion })
    }
}
