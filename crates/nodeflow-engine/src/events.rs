//! Event types for streaming run progress
//!
//! Events are sent from the executor to any consumer (a log, a CLI progress
//! line, a test) to report node lifecycle transitions as they happen.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::error::{NodeExecutionError, NodeFailure};

/// Trait for receiving run events
///
/// This abstracts over the transport mechanism (mpsc, log, collector)
/// so the executor can be used in different contexts. Sending must not
/// block; the executor calls it from its coordinating task.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel
    /// closed). Delivery failures are logged and never fail the run.
    fn send(&self, event: RunEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    /// Run passed pre-flight checks and is about to execute nodes
    #[serde(rename_all = "camelCase")]
    RunStarted {
        execution_id: String,
        order: Vec<String>,
    },

    /// A node started executing
    #[serde(rename_all = "camelCase")]
    NodeStarted { execution_id: String, node: String },

    /// A node produced a valid output
    #[serde(rename_all = "camelCase")]
    NodeCompleted {
        execution_id: String,
        node: String,
        output: serde_json::Value,
    },

    /// A node failed
    #[serde(rename_all = "camelCase")]
    NodeFailed {
        execution_id: String,
        node: String,
        failure: NodeFailure,
    },

    /// A node was not executed because an upstream node failed
    #[serde(rename_all = "camelCase")]
    NodeSkipped {
        execution_id: String,
        node: String,
        cause: NodeExecutionError,
    },

    /// Every node has either completed, failed, or been skipped
    #[serde(rename_all = "camelCase")]
    RunCompleted {
        execution_id: String,
        succeeded: usize,
        failed: usize,
        skipped: usize,
    },
}

impl RunEvent {
    /// Name of the node this event is about, if any
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::NodeStarted { node, .. }
            | Self::NodeCompleted { node, .. }
            | Self::NodeFailed { node, .. }
            | Self::NodeSkipped { node, .. } => Some(node),
            Self::RunStarted { .. } | Self::RunCompleted { .. } => None,
        }
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: RunEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<RunEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RunEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<RunEvent> {
        self.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: RunEvent) -> Result<(), EventError> {
        self.lock().push(event);
        Ok(())
    }
}

/// Event sink that forwards events over a tokio mpsc channel
pub struct ChannelEventSink {
    tx: tokio::sync::mpsc::UnboundedSender<RunEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: RunEvent) -> Result<(), EventError> {
        self.tx.send(event).map_err(|_| EventError::channel_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(node: &str) -> RunEvent {
        RunEvent::NodeStarted {
            execution_id: "exec-1".to_string(),
            node: node.to_string(),
        }
    }

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();
        sink.send(started("a")).unwrap();
        sink.send(started("b")).unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].node(), Some("b"));

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(started("gen")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "nodeStarted", "executionId": "exec-1", "node": "gen"})
        );
    }

    #[tokio::test]
    async fn test_channel_event_sink() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelEventSink::new(tx);
        sink.send(started("a")).unwrap();
        assert_eq!(rx.recv().await, Some(started("a")));

        drop(rx);
        assert!(sink.send(started("b")).is_err());
    }
}
