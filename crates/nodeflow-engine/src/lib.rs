//! Nodeflow Engine - Graph-based node execution
//!
//! This crate runs graphs of named, typed nodes. It supports:
//!
//! - Schema-checked node inputs and outputs
//! - Deterministic dependency resolution with cycle detection
//! - Concurrent execution of independent branches
//! - Failure isolation (a failed node only skips its dependents)
//! - Graph documents that round-trip through JSON
//!
//! # Architecture
//!
//! - `Node`: object-safe node contract; `TypedNode` and `FnNode` build nodes
//! - `Graph`: immutable, shareable set of nodes and connections
//! - `resolve`: Kahn ordering with a lexical tie-break
//! - `Executor`: runs a graph for a `RunRequest` and returns a `RunReport`
//! - `EventSink`: run progress streaming (not tied to any transport)
//!
//! # Example
//!
//! ```ignore
//! use nodeflow_engine::{Executor, GraphBuilder, RunRequest};
//!
//! let graph = GraphBuilder::new()
//!     .node(hello_world)
//!     .build()?;
//!
//! let report = Executor::default()
//!     .run(&graph, RunRequest::new().with_sink("helloWorld"))
//!     .await?;
//! ```

pub mod builder;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod executor;
pub mod graph;
pub mod node;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::GraphBuilder;
pub use config::ExecutorConfig;
pub use error::{
    CycleError, GraphConfigError, NodeError, NodeExecutionError, NodeFailure, ProviderError,
    Result, RunError,
};
pub use events::{ChannelEventSink, EventError, EventSink, NullEventSink, RunEvent, VecEventSink};
pub use executor::{Executor, RunRequest};
pub use graph::Graph;
pub use node::{FnNode, Node, NodeKind, Renamed, Typed, TypedNode};
pub use registry::{NodeDescriptor, NodeRegistry};
pub use report::{NodeStatus, RunReport, SinkResult};
pub use resolver::{resolve, ExecutionPlan};
pub use schema::{validate, FieldSchema, Schema, SchemaError};
pub use types::{Connection, DocumentError, GraphDocument, NodeEntry, NodeName};

// Re-export for implementors of `Node`/`TypedNode`
pub use async_trait::async_trait;
