//! Append Record Node
//!
//! Stores a record on behalf of the current user.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use nodeflow_engine::{FieldSchema, Node, NodeError, NodeKind, Schema, Typed, TypedNode};
use serde::{Deserialize, Serialize};

use crate::identity::IdentityProvider;
use crate::records::{NewRecord, RecordStore};

/// Input of [`AppendRecordNode`]
#[derive(Debug, Clone, Deserialize)]
pub struct AppendRecordInput {
    pub collection: String,
    pub fields: serde_json::Value,
}

/// Output of [`AppendRecordNode`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppendRecordOutput {
    pub id: String,
}

/// Append Record Node
///
/// Stamps the record with the current user id and the current time, then
/// appends it to the record store. Fails without an authenticated user.
///
/// # Inputs
/// - `collection` (required) - Target collection name
/// - `fields` (required) - Record contents
///
/// # Outputs
/// - `id` - Id assigned by the store
#[derive(Clone)]
pub struct AppendRecordNode {
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AppendRecordNode {
    /// Registered name
    pub const NAME: &'static str = "appendRecord";
    /// Port ID for collection input
    pub const PORT_COLLECTION: &'static str = "collection";
    /// Port ID for fields input
    pub const PORT_FIELDS: &'static str = "fields";
    /// Port ID for id output
    pub const PORT_ID: &'static str = "id";

    pub fn new(store: Arc<dyn RecordStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Wrap under the registered name
    pub fn into_node(self) -> Arc<dyn Node> {
        self.named(Self::NAME)
    }

    /// Wrap under a custom name
    pub fn named(self, name: impl Into<String>) -> Arc<dyn Node> {
        Typed::new(name, self).into_node()
    }
}

#[async_trait]
impl TypedNode for AppendRecordNode {
    type Input = AppendRecordInput;
    type Output = AppendRecordOutput;
    const KIND: NodeKind = NodeKind::Io;

    fn input_schema(&self) -> Schema {
        Schema::record([
            FieldSchema::required(Self::PORT_COLLECTION, Schema::String),
            FieldSchema::required(Self::PORT_FIELDS, Schema::Any),
        ])
    }

    fn output_schema(&self) -> Schema {
        Schema::record([FieldSchema::required(Self::PORT_ID, Schema::String)])
    }

    async fn run(&self, input: AppendRecordInput) -> Result<AppendRecordOutput, NodeError> {
        let user_id = self
            .identity
            .current_user_id()
            .await
            .map_err(|e| NodeError::failed(e.to_string()))?;

        let record = self
            .store
            .append(NewRecord {
                collection: input.collection,
                fields: input.fields,
                created_by: user_id,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| NodeError::failed(e.to_string()))?;

        log::debug!(
            "Appended record {} to '{}' for {}",
            record.id,
            record.collection,
            record.created_by
        );
        Ok(AppendRecordOutput { id: record.id })
    }
}
