//! Run results
//!
//! A [`RunReport`] is produced for every run that passes pre-flight checks,
//! even when some nodes fail. It never omits a requested sink.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::NodeExecutionError;

/// Final state of one node in a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NodeStatus {
    /// Executed and produced a valid output
    Succeeded { output: Value },
    /// Input gathering, validation, or execution failed
    Failed { error: NodeExecutionError },
    /// Never executed because an upstream node failed
    Skipped { cause: NodeExecutionError },
}

impl NodeStatus {
    /// Output of a succeeded node
    pub fn output(&self) -> Option<&Value> {
        match self {
            Self::Succeeded { output } => Some(output),
            _ => None,
        }
    }

    /// The error that prevented this node from producing an output
    pub fn error(&self) -> Option<&NodeExecutionError> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { error } => Some(error),
            Self::Skipped { cause } => Some(cause),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Outcome of a sink: its output, or the error that caused it to have none
pub type SinkResult = Result<Value, NodeExecutionError>;

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Unique id of this run
    pub execution_id: String,
    /// Resolved execution order
    pub order: Vec<String>,
    /// Final status of every node
    pub nodes: BTreeMap<String, NodeStatus>,
    /// Result of every requested sink
    #[serde(serialize_with = "serialize_sinks")]
    pub sinks: BTreeMap<String, SinkResult>,
    /// Wall-clock duration of the execution phase
    pub duration_ms: u64,
}

impl RunReport {
    /// Result of a requested sink
    pub fn sink(&self, name: &str) -> Option<&SinkResult> {
        self.sinks.get(name)
    }

    /// Output of a requested sink, if it succeeded
    pub fn sink_output(&self, name: &str) -> Option<&Value> {
        self.sinks.get(name).and_then(|r| r.as_ref().ok())
    }

    /// Final status of a node
    pub fn status(&self, name: &str) -> Option<&NodeStatus> {
        self.nodes.get(name)
    }

    /// Number of nodes that succeeded
    pub fn succeeded(&self) -> usize {
        self.nodes.values().filter(|s| s.is_succeeded()).count()
    }

    /// Number of nodes that failed
    pub fn failed(&self) -> usize {
        self.nodes.values().filter(|s| s.is_failed()).count()
    }

    /// Number of nodes that were skipped
    pub fn skipped(&self) -> usize {
        self.nodes.values().filter(|s| s.is_skipped()).count()
    }

    /// Whether every requested sink produced an output
    pub fn is_success(&self) -> bool {
        self.sinks.values().all(|r| r.is_ok())
    }

    /// Render the report as pretty JSON for diagnostics
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum SinkEntry<'a> {
    Output(&'a Value),
    Error(&'a NodeExecutionError),
}

fn serialize_sinks<S: Serializer>(
    sinks: &BTreeMap<String, SinkResult>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(sinks.len()))?;
    for (name, result) in sinks {
        let entry = match result {
            Ok(output) => SinkEntry::Output(output),
            Err(error) => SinkEntry::Error(error),
        };
        map.serialize_entry(name, &entry)?;
    }
    map.end()
}
