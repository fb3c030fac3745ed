//! Echo Node
//!
//! Returns its text input unchanged. Useful as a sink for record outputs.

use std::sync::Arc;

use async_trait::async_trait;
use nodeflow_engine::{FieldSchema, Node, NodeError, NodeKind, Schema, Typed, TypedNode};
use serde::Deserialize;

/// Input of [`EchoNode`]
#[derive(Debug, Deserialize)]
pub struct EchoInput {
    pub text: String,
}

/// Echo Node
///
/// # Inputs
/// - `text` (required) - The text to echo
///
/// # Output
/// The same text, as a plain string
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoNode;

impl EchoNode {
    /// Registered name
    pub const NAME: &'static str = "echo";
    /// Port ID for text input
    pub const PORT_TEXT: &'static str = "text";

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
impl TypedNode for EchoNode {
    type Input = EchoInput;
    type Output = String;
    const KIND: NodeKind = NodeKind::Pure;

    fn input_schema(&self) -> Schema {
        Schema::record([FieldSchema::required(Self::PORT_TEXT, Schema::String)
            .with_description("The text to echo")])
    }

    fn output_schema(&self) -> Schema {
        Schema::String
    }

    async fn run(&self, input: EchoInput) -> Result<String, NodeError> {
        Ok(input.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeflow_engine::validate;
    use proptest::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_echo() {
        let node = EchoNode.into_node();
        let output = node.execute(json!({"text": "ping"})).await.unwrap();
        assert_eq!(output, json!("ping"));
    }

    #[test]
    fn test_requires_text() {
        let node = EchoNode.into_node();
        let err = validate(node.input_schema(), &json!({})).unwrap_err();
        assert_eq!(err.field, "$.text");
        assert_eq!(err.received, "absent");
    }

    proptest! {
        #[test]
        fn prop_echo_returns_input(text in ".*") {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let node = EchoNode.into_node();
            let output = runtime.block_on(node.execute(json!({"text": text.clone()}))).unwrap();
            prop_assert_eq!(output, json!(text));
        }
    }
}
