//! Nodeflow Nodes
//!
//! Built-in node implementations for the Nodeflow engine, plus the
//! collaborator interfaces they depend on.
//!
//! # Categories
//!
//! - **Input**: Nodes that produce data without upstream input
//! - **Processing**: Nodes that transform or generate data (echo, LLM completion)
//! - **Storage**: Nodes that persist records
//!
//! # Collaborators
//!
//! - [`TextProvider`]: text completion (OpenAI-compatible HTTP implementation)
//! - [`RecordStore`]: record persistence (in-memory implementation)
//! - [`IdentityProvider`]: current user lookup

pub mod config;
pub mod identity;
pub mod input;
pub mod processing;
pub mod provider;
pub mod records;
pub mod setup;
pub mod storage;

pub use config::ProviderConfig;
pub use identity::{IdentityError, IdentityProvider, StaticIdentity};
pub use input::*;
pub use processing::*;
pub use provider::{CompletionOptions, OpenAiProvider, TextProvider};
pub use records::{MemoryRecordStore, NewRecord, Record, RecordFilter, RecordStore, RecordStoreError};
pub use setup::{builtin_registry, Services};
pub use storage::*;

#[cfg(test)]
mod tests {
    use super::*;
    use nodeflow_engine::NodeKind;

    #[test]
    fn test_builtin_registry_contents() {
        let services = Services::from_config(ProviderConfig::default(), None).unwrap();
        let registry = builtin_registry(&services);

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["appendRecord", "echo", "helloWorld", "textCompletion"]
        );
        assert_eq!(registry.get("helloWorld").unwrap().kind(), NodeKind::Pure);
        assert_eq!(registry.get("echo").unwrap().kind(), NodeKind::Pure);
        assert_eq!(registry.get("textCompletion").unwrap().kind(), NodeKind::Io);
        assert_eq!(registry.get("appendRecord").unwrap().kind(), NodeKind::Io);
    }
}
