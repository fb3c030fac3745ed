//! Fluent builder for graphs
//!
//! Provides a fluent API for constructing graphs programmatically.

use std::sync::Arc;

use crate::error::GraphConfigError;
use crate::graph::Graph;
use crate::node::Node;
use crate::types::Connection;

/// Fluent builder for constructing graphs
///
/// # Example
///
/// ```ignore
/// let graph = GraphBuilder::new()
///     .node(gen)
///     .node(echo)
///     .connect_channels("gen", "completion", "echo", "text")
///     .build()?;
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<Arc<dyn Node>>,
    connections: Vec<Connection>,
}

impl GraphBuilder {
    /// Create a new graph builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph
    pub fn node(mut self, node: Arc<dyn Node>) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add several nodes
    pub fn nodes(mut self, nodes: impl IntoIterator<Item = Arc<dyn Node>>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Route the whole output of `from` as the whole input of `to`
    pub fn connect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.connection(Connection::new(from, to))
    }

    /// Route field `output` of `from` into field `input` of `to`
    pub fn connect_channels(
        self,
        from: impl Into<String>,
        output: impl Into<String>,
        to: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        self.connection(Connection::new(from, to).from_output(output).to_input(input))
    }

    /// Add a fully specified connection
    pub fn connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    /// Build and validate the graph
    ///
    /// Checks node name uniqueness and connection endpoints. Wiring and
    /// cycle checks happen when the graph is run.
    pub fn build(self) -> Result<Graph, GraphConfigError> {
        Graph::new(self.nodes, self.connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FnNode;
    use crate::schema::Schema;

    fn passthrough(name: &str) -> Arc<dyn Node> {
        FnNode::pure(name, Schema::Any, Schema::Any, Ok).into_node()
    }

    #[test]
    fn test_graph_builder() {
        let graph = GraphBuilder::new()
            .node(passthrough("input-1"))
            .node(passthrough("output-1"))
            .connect_channels("input-1", "text", "output-1", "text")
            .build()
            .unwrap();

        assert_eq!(graph.len(), 2);
        let conn = &graph.connections()[0];
        assert_eq!(conn.from_output.as_deref(), Some("text"));
        assert_eq!(conn.to_input.as_deref(), Some("text"));
    }

    #[test]
    fn test_builder_keeps_connection_order() {
        let graph = GraphBuilder::new()
            .nodes([passthrough("a"), passthrough("b"), passthrough("c")])
            .connect("a", "b")
            .connect("b", "c")
            .build()
            .unwrap();

        assert_eq!(graph.connections()[0], Connection::new("a", "b"));
        assert_eq!(graph.connections()[1], Connection::new("b", "c"));
    }

    #[test]
    fn test_builder_rejects_unknown_endpoint() {
        let err = GraphBuilder::new()
            .node(passthrough("a"))
            .connect("a", "missing")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphConfigError::UnknownConnectionNode { .. }));
    }
}
