//! Storage nodes
//!
//! Nodes that persist data through a record store.

mod append_record;

pub use append_record::{AppendRecordInput, AppendRecordNode, AppendRecordOutput};
