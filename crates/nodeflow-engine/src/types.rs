//! Core types for graph topology
//!
//! These types describe how nodes are wired together and the serialized form
//! of a graph. Node behaviour (schemas, execute functions) is never
//! serialized; a [`GraphDocument`] only carries names, kinds and connections.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::NodeKind;

/// Unique name of a node within a graph
pub type NodeName = String;

/// A directed edge routing a node's output into another node's input
///
/// `from_output: None` routes the whole output value; `Some(field)` routes
/// that field of a record output. `to_input: None` makes the routed value the
/// whole input; `Some(field)` sets that field of the input record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Producing node
    pub from_node: NodeName,
    /// Output channel of the producer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_output: Option<String>,
    /// Consuming node
    pub to_node: NodeName,
    /// Input channel of the consumer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_input: Option<String>,
}

impl Connection {
    /// Connect whole output to whole input
    pub fn new(from_node: impl Into<String>, to_node: impl Into<String>) -> Self {
        Self {
            from_node: from_node.into(),
            from_output: None,
            to_node: to_node.into(),
            to_input: None,
        }
    }

    /// Select a named output channel
    pub fn from_output(mut self, channel: impl Into<String>) -> Self {
        self.from_output = Some(channel.into());
        self
    }

    /// Target a named input channel
    pub fn to_input(mut self, channel: impl Into<String>) -> Self {
        self.to_input = Some(channel.into());
        self
    }

    /// Label of the target channel for diagnostics
    pub fn input_channel_label(&self) -> String {
        match &self.to_input {
            Some(channel) => format!("'{}'", channel),
            None => "(whole value)".to_string(),
        }
    }
}

/// Serialized node entry in a [`GraphDocument`]
///
/// `name` identifies the node within the graph. `node` names the registered
/// definition it is built from and defaults to `name`, so one definition can
/// appear under several names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    /// Node name
    pub name: NodeName,
    /// Registered definition, when different from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Declared kind
    pub kind: NodeKind,
}

impl NodeEntry {
    /// Entry whose definition has the same name
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            node: None,
            kind,
        }
    }

    /// Build this entry from a differently named definition
    pub fn of(mut self, definition: impl Into<String>) -> Self {
        let definition = definition.into();
        self.node = (definition != self.name).then_some(definition);
        self
    }

    /// Name of the registered definition
    pub fn definition(&self) -> &str {
        self.node.as_deref().unwrap_or(&self.name)
    }
}

/// Serialized graph topology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    /// Nodes in declaration order
    pub nodes: Vec<NodeEntry>,
    /// Connections in declaration order
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// Error reading or writing a graph document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphDocument {
    /// Parse a document from JSON text
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the document as pretty JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a document from a JSON file
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write the document to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
