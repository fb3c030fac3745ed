//! Input nodes
//!
//! Nodes that produce data without upstream input.

mod hello_world;

pub use hello_world::HelloWorldNode;
