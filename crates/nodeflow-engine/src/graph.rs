//! Immutable node graph
//!
//! A [`Graph`] maps node names to nodes and holds the ordered connection
//! list. It is checked once at construction (unique names, connections
//! between existing nodes) and never mutated afterwards, so one graph can
//! back any number of concurrent runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::GraphConfigError;
use crate::node::Node;
use crate::types::{Connection, GraphDocument, NodeEntry, NodeName};

/// A validated set of nodes and connections
#[derive(Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeName, Arc<dyn Node>>,
    /// Node names in declaration order
    declared: Vec<NodeName>,
    connections: Vec<Connection>,
}

impl Graph {
    /// Create a graph, checking names and connection endpoints
    pub fn new(
        nodes: impl IntoIterator<Item = Arc<dyn Node>>,
        connections: Vec<Connection>,
    ) -> Result<Self, GraphConfigError> {
        let mut by_name = BTreeMap::new();
        let mut declared = Vec::new();
        for node in nodes {
            let name = node.name().to_string();
            if by_name.contains_key(&name) {
                return Err(GraphConfigError::DuplicateNode(name));
            }
            declared.push(name.clone());
            by_name.insert(name, node);
        }

        for (index, conn) in connections.iter().enumerate() {
            for endpoint in [&conn.from_node, &conn.to_node] {
                if !by_name.contains_key(endpoint) {
                    return Err(GraphConfigError::UnknownConnectionNode {
                        index,
                        node: endpoint.clone(),
                    });
                }
            }
        }

        Ok(Self {
            nodes: by_name,
            declared,
            connections,
        })
    }

    /// Find a node by name
    pub fn node(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(name)
    }

    /// Check if a node exists
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Iterate nodes in name order
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<dyn Node>> {
        self.nodes.values()
    }

    /// Iterate node names in lexical order
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Connections in declaration order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get connections coming into a node
    pub fn incoming<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.to_node == name)
    }

    /// Get connections going out of a node
    pub fn outgoing<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.from_node == name)
    }

    /// Serializable topology of this graph, nodes in declaration order
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self
                .declared
                .iter()
                .filter_map(|name| self.nodes.get(name))
                .map(|n| NodeEntry::new(n.name(), n.kind()).of(n.definition()))
                .collect(),
            connections: self.connections.clone(),
        }
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("connections", &self.connections)
            .finish()
    }
}
