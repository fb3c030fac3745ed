//! Hello World Node
//!
//! A source node that always produces the same greeting.

use std::sync::Arc;

use async_trait::async_trait;
use nodeflow_engine::{Node, NodeError, NodeKind, Schema, Typed, TypedNode};

/// Hello World Node
///
/// Takes no input and outputs `"Hello, world!"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloWorldNode;

impl HelloWorldNode {
    /// Registered name
    pub const NAME: &'static str = "helloWorld";
    /// The greeting
    pub const GREETING: &'static str = "Hello, world!";

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
impl TypedNode for HelloWorldNode {
    type Input = ();
    type Output = String;
    const KIND: NodeKind = NodeKind::Pure;

    fn input_schema(&self) -> Schema {
        Schema::Void
    }

    fn output_schema(&self) -> Schema {
        Schema::String
    }

    async fn run(&self, _input: ()) -> Result<String, NodeError> {
        Ok(Self::GREETING.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_greeting() {
        let node = HelloWorldNode.into_node();
        assert_eq!(node.name(), "helloWorld");
        assert_eq!(node.kind(), NodeKind::Pure);
        assert_eq!(node.execute(Value::Null).await.unwrap(), json!("Hello, world!"));
    }
}
