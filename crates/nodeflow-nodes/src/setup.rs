//! Registry setup for host applications.
//!
//! Hosts build a [`Services`] value at startup and pass it to
//! [`builtin_registry`] to get every built-in node wired to those services.
//! The registry is an ordinary value; hosts can merge their own nodes into
//! it before instantiating graph documents.
//!
//! # Example
//!
//! ```ignore
//! let services = nodeflow_nodes::Services::from_env(Some("user-1".into()))?;
//! let registry = nodeflow_nodes::builtin_registry(&services);
//! let graph = registry.instantiate(&document)?;
//! ```

use std::sync::Arc;

use nodeflow_engine::{NodeRegistry, ProviderError};

use crate::config::ProviderConfig;
use crate::identity::{IdentityProvider, StaticIdentity};
use crate::input::HelloWorldNode;
use crate::processing::{EchoNode, TextCompletionNode};
use crate::provider::{OpenAiProvider, TextProvider};
use crate::records::{MemoryRecordStore, RecordStore};
use crate::storage::AppendRecordNode;

/// External collaborators used by built-in nodes
#[derive(Clone)]
pub struct Services {
    pub provider: Arc<dyn TextProvider>,
    pub records: Arc<dyn RecordStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Services {
    pub fn new(
        provider: Arc<dyn TextProvider>,
        records: Arc<dyn RecordStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            provider,
            records,
            identity,
        }
    }

    /// HTTP provider from `config`, an in-memory record store, and a static
    /// identity (anonymous when `user_id` is `None`)
    pub fn from_config(
        config: ProviderConfig,
        user_id: Option<String>,
    ) -> Result<Self, ProviderError> {
        log::info!(
            "Using completion provider at {} (model '{}')",
            config.base_url,
            config.model
        );
        let identity = match user_id {
            Some(id) => StaticIdentity::new(id),
            None => StaticIdentity::anonymous(),
        };
        Ok(Self::new(
            Arc::new(OpenAiProvider::new(config)?),
            Arc::new(MemoryRecordStore::new()),
            Arc::new(identity),
        ))
    }

    /// [`from_config`](Self::from_config) with [`ProviderConfig::from_env`]
    pub fn from_env(user_id: Option<String>) -> Result<Self, ProviderError> {
        Self::from_config(ProviderConfig::from_env(), user_id)
    }
}

/// Registry of all built-in nodes under their registered names
pub fn builtin_registry(services: &Services) -> NodeRegistry {
    NodeRegistry::new()
        .with(HelloWorldNode.into_node())
        .with(EchoNode.into_node())
        .with(TextCompletionNode::new(services.provider.clone()).into_node())
        .with(
            AppendRecordNode::new(services.records.clone(), services.identity.clone())
                .into_node(),
        )
}
