//! Processing nodes
//!
//! Nodes that transform or generate data.

mod echo;
mod text_completion;

pub use echo::{EchoInput, EchoNode};
pub use text_completion::{TextCompletionInput, TextCompletionNode, TextCompletionOutput};
