//! Pre-flight validation for graphs and execution requests
//!
//! Everything here runs before any node executes. Each check returns all the
//! problems it finds (not just the first) so callers can report them together.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::GraphConfigError;
use crate::executor::RunRequest;
use crate::graph::Graph;
use crate::schema::validate;
use crate::types::Connection;

/// Validate how connections feed node inputs
///
/// Rejects two connections targeting the same input channel, and nodes that
/// mix a whole-value connection with named-field connections.
pub fn validate_wiring(graph: &Graph) -> Vec<GraphConfigError> {
    let mut errors = Vec::new();

    for name in graph.node_names() {
        let mut per_channel: BTreeMap<Option<&str>, Vec<&Connection>> = BTreeMap::new();
        for conn in graph.incoming(name) {
            per_channel.entry(conn.to_input.as_deref()).or_default().push(conn);
        }
        if per_channel.is_empty() {
            continue;
        }

        let has_whole = per_channel.contains_key(&None);
        let has_named = per_channel.keys().any(|k| k.is_some());
        if has_whole && has_named {
            errors.push(GraphConfigError::ConflictingInputChannels(name.to_string()));
        }

        for conns in per_channel.values() {
            if conns.len() > 1 {
                errors.push(GraphConfigError::DuplicateInputChannel {
                    node: name.to_string(),
                    channel: conns[0].input_channel_label(),
                    count: conns.len(),
                });
            }
        }
    }

    errors
}

/// Validate an execution request against a graph
///
/// Checks sinks and initial inputs name real nodes, that initial inputs only
/// target unconnected nodes, and that every source without an initial input
/// accepts the absence value.
pub fn validate_request(graph: &Graph, request: &RunRequest) -> Vec<GraphConfigError> {
    let mut errors = Vec::new();

    for sink in &request.sinks {
        if !graph.contains(sink) {
            errors.push(GraphConfigError::UnknownSink(sink.clone()));
        }
    }

    for name in request.initial_inputs.keys() {
        if !graph.contains(name) {
            errors.push(GraphConfigError::UnknownInputNode(name.clone()));
        } else if !is_source(graph, name) {
            errors.push(GraphConfigError::InputForConnectedNode(name.clone()));
        }
    }

    for node in graph.nodes() {
        let name = node.name();
        if !is_source(graph, name) || request.initial_inputs.contains_key(name) {
            continue;
        }
        if let Err(error) = validate(node.input_schema(), &Value::Null) {
            errors.push(GraphConfigError::SourceRequiresInput {
                node: name.to_string(),
                error,
            });
        }
    }

    errors
}

fn is_source(graph: &Graph, name: &str) -> bool {
    graph.incoming(name).next().is_none()
}
