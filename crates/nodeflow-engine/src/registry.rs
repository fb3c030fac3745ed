//! Explicit node registry
//!
//! A [`NodeRegistry`] maps node names to node instances. It is an ordinary
//! value built once by the caller and passed to wherever graph documents are
//! instantiated; there is no process-wide registry.
//!
//! # Usage
//!
//! ```ignore
//! use nodeflow_engine::{GraphDocument, NodeRegistry};
//!
//! let mut registry = NodeRegistry::new();
//! registry.register(my_node);
//!
//! let graph = registry.instantiate(&GraphDocument::load(path)?)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::GraphConfigError;
use crate::graph::Graph;
use crate::node::{Node, NodeKind, Renamed};
use crate::schema::Schema;
use crate::types::GraphDocument;

/// Serializable description of a registered node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub name: String,
    pub kind: NodeKind,
    pub input_schema: Schema,
    pub output_schema: Schema,
}

impl NodeDescriptor {
    fn of(node: &dyn Node) -> Self {
        Self {
            name: node.name().to_string(),
            kind: node.kind(),
            input_schema: node.input_schema().clone(),
            output_schema: node.output_schema().clone(),
        }
    }
}

/// Registry of nodes available to graph documents
///
/// # Composability
///
/// Registries can be composed by merging:
/// ```ignore
/// let mut registry = builtin_registry(services);
/// registry.merge(plugin_registry); // Add or override nodes
/// ```
#[derive(Clone, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<String, Arc<dyn Node>>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under its own name, replacing any previous entry
    pub fn register(&mut self, node: Arc<dyn Node>) {
        self.nodes.insert(node.name().to_string(), node);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, node: Arc<dyn Node>) -> Self {
        self.register(node);
        self
    }

    /// Get a node by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(name)
    }

    /// Check if a node is registered
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Registered names in lexical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Describe every registered node, in name order
    pub fn descriptors(&self) -> Vec<NodeDescriptor> {
        self.nodes.values().map(|n| NodeDescriptor::of(n.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` that share a name.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.nodes.extend(other.nodes);
    }

    /// Build a graph from a document
    ///
    /// Each entry's definition must be registered with the kind the document
    /// declares. The definition is bound under the entry's name, so one
    /// definition can back several nodes.
    pub fn instantiate(&self, document: &GraphDocument) -> Result<Graph, GraphConfigError> {
        let mut nodes = Vec::with_capacity(document.nodes.len());
        for entry in &document.nodes {
            let definition = entry.definition();
            let node = self
                .get(definition)
                .ok_or_else(|| GraphConfigError::UnregisteredNode(definition.to_string()))?;
            if node.kind() != entry.kind {
                return Err(GraphConfigError::KindMismatch {
                    node: entry.name.clone(),
                    declared: entry.kind,
                    registered: node.kind(),
                });
            }
            nodes.push(Renamed::bind(entry.name.clone(), node.clone()));
        }

        log::debug!(
            "Instantiated graph with {} nodes and {} connections",
            nodes.len(),
            document.connections.len()
        );
        Graph::new(nodes, document.connections.clone())
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}
