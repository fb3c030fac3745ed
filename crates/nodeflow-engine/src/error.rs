//! Error types for the node engine
//!
//! Errors fall into two groups. [`RunError`] aborts a run before any node
//! executes (bad wiring, unknown sinks, cycles). [`NodeExecutionError`] is
//! localized to one node and the nodes downstream of it, and is reported
//! inside the [`RunReport`](crate::report::RunReport) instead of aborting.

use serde::Serialize;
use thiserror::Error;

use crate::node::NodeKind;
use crate::schema::SchemaError;

/// Result type alias using RunError
pub type Result<T> = std::result::Result<T, RunError>;

/// Errors that abort a run before any node executes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The graph or the request is structurally invalid
    #[error(transparent)]
    GraphConfig(#[from] GraphConfigError),

    /// The connection set contains a dependency cycle
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// Structural problems with a graph or an execution request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphConfigError {
    /// Two nodes share a name
    #[error("Duplicate node name '{0}'")]
    DuplicateNode(String),

    /// A connection references a node that is not in the graph
    #[error("Connection #{index} references unknown node '{node}'")]
    UnknownConnectionNode { index: usize, node: String },

    /// A requested sink is not a node in the graph
    #[error("Requested sink '{0}' is not a node in the graph")]
    UnknownSink(String),

    /// An initial input names a node that is not in the graph
    #[error("Initial input supplied for unknown node '{0}'")]
    UnknownInputNode(String),

    /// More than one connection targets the same input channel
    #[error("Input channel {channel} of node '{node}' has {count} inbound connections")]
    DuplicateInputChannel {
        node: String,
        channel: String,
        count: usize,
    },

    /// A node receives both a whole-value connection and named-field connections
    #[error("Node '{0}' mixes whole-value and named-field inbound connections")]
    ConflictingInputChannels(String),

    /// An initial input targets a node that is fed by connections
    #[error("Node '{0}' has inbound connections and cannot also take an initial input")]
    InputForConnectedNode(String),

    /// A zero-input source whose input contract rejects absence
    #[error("Source node '{node}' has no input and its contract rejects absence: {error}")]
    SourceRequiresInput { node: String, error: SchemaError },

    /// A graph document names a node the registry does not know
    #[error("Node '{0}' is not registered")]
    UnregisteredNode(String),

    /// A graph document declares a different kind than the registered node
    #[error("Node '{node}' is declared as {declared} but registered as {registered}")]
    KindMismatch {
        node: String,
        declared: NodeKind,
        registered: NodeKind,
    },
}

/// Dependency cycle found while resolving the execution order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Dependency cycle among nodes: {}", .involved_nodes.join(", "))]
pub struct CycleError {
    /// Nodes left with unresolved dependencies, sorted by name
    pub involved_nodes: Vec<String>,
}

/// Failure of an external service called by an `io` node
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "camelCase")]
pub enum ProviderError {
    /// Network or connection failure
    #[error("Provider transport error: {0}")]
    Transport(String),

    /// Rate limit or quota exhausted
    #[error("Provider quota exceeded: {0}")]
    Quota(String),

    /// Non-success HTTP status other than quota errors
    #[error("Provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider is missing credentials or an endpoint
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Error value returned by [`Node::execute`](crate::node::Node::execute)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The node's own logic failed
    #[error("{0}")]
    Failed(String),

    /// An external provider failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl NodeError {
    /// Create a failure with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Why a node did not produce an output
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeFailure {
    /// Gathered input did not match the input contract
    #[error("invalid input: {error}")]
    InvalidInput { error: SchemaError },

    /// Returned output did not match the output contract
    #[error("invalid output: {error}")]
    InvalidOutput { error: SchemaError },

    /// A connection selected a field the producer's output does not have
    #[error("upstream node '{from}' has no output channel '{channel}'")]
    MissingOutputChannel { from: String, channel: String },

    /// `execute` returned an error
    #[error("{message}")]
    Execution { message: String },

    /// `execute` returned a provider error
    #[error("{error}")]
    Provider { error: ProviderError },

    /// The node task panicked
    #[error("node task panicked: {message}")]
    Panicked { message: String },
}

impl From<NodeError> for NodeFailure {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Failed(message) => Self::Execution { message },
            NodeError::Provider(error) => Self::Provider { error },
        }
    }
}

/// A node failed; its downstream nodes are skipped
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("Node '{node}' failed: {failure}")]
pub struct NodeExecutionError {
    /// Name of the node that failed
    pub node: String,
    /// What went wrong
    pub failure: NodeFailure,
}

impl NodeExecutionError {
    /// Create an error for a node
    pub fn new(node: impl Into<String>, failure: impl Into<NodeFailure>) -> Self {
        Self {
            node: node.into(),
            failure: failure.into(),
        }
    }

    /// Whether this failure came from an external provider
    pub fn is_provider_error(&self) -> bool {
        matches!(self.failure, NodeFailure::Provider { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_lists_nodes() {
        let err = CycleError {
            involved_nodes: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Dependency cycle among nodes: a, b");
    }

    #[test]
    fn test_node_error_maps_to_failure() {
        let failure: NodeFailure = NodeError::failed("boom").into();
        assert_eq!(
            failure,
            NodeFailure::Execution {
                message: "boom".to_string()
            }
        );

        let failure: NodeFailure =
            NodeError::from(ProviderError::Quota("slow down".to_string())).into();
        assert!(matches!(failure, NodeFailure::Provider { .. }));
    }

    #[test]
    fn test_provider_error_is_flagged() {
        let err = NodeExecutionError::new(
            "gen",
            NodeError::Provider(ProviderError::Transport("reset".to_string())),
        );
        assert!(err.is_provider_error());
        assert_eq!(
            err.to_string(),
            "Node 'gen' failed: Provider transport error: reset"
        );
    }

    #[test]
    fn test_run_error_is_transparent() {
        let err: RunError = GraphConfigError::UnknownSink("nope".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Requested sink 'nope' is not a node in the graph"
        );
    }
}
