//! Record storage
//!
//! A [`RecordStore`] holds schemaless records grouped into named
//! collections. Every record carries who created it and when.
//! [`MemoryRecordStore`] keeps records in process memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nodeflow_engine::schema::describe;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

/// Record store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordStoreError {
    /// No record has the given id
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Patch fields cannot be applied to the record
    #[error("Invalid patch for record {id}: {reason}")]
    InvalidPatch { id: String, reason: String },

    /// The storage backend failed
    #[error("Record store backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, RecordStoreError>;

/// A record to be appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub collection: String,
    pub fields: Value,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Store-assigned id
    pub id: String,
    pub collection: String,
    pub fields: Value,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Criteria for [`RecordStore::list`]; empty criteria match everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl RecordFilter {
    /// Match records of one collection
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            created_by: None,
        }
    }

    /// Also require a creator
    pub fn created_by(mut self, user_id: impl Into<String>) -> Self {
        self.created_by = Some(user_id.into());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.collection
            .as_ref()
            .map_or(true, |c| *c == record.collection)
            && self
                .created_by
                .as_ref()
                .map_or(true, |u| *u == record.created_by)
    }
}

/// Persistent storage for records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a record and return it with its assigned id
    async fn append(&self, record: NewRecord) -> Result<Record>;

    /// Records matching a filter, newest first
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>>;

    /// Shallow-merge `fields` into a record's fields
    async fn patch(&self, id: &str, fields: Map<String, Value>) -> Result<Record>;
}

/// In-memory record store
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn append(&self, record: NewRecord) -> Result<Record> {
        let record = Record {
            id: uuid::Uuid::new_v4().to_string(),
            collection: record.collection,
            fields: record.fields,
            created_by: record.created_by,
            created_at: record.created_at,
        };
        log::debug!(
            "Appending record {} to collection '{}'",
            record.id,
            record.collection
        );
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        let records = self.records.read().await;
        // Stable sort keeps later appends first among equal timestamps
        let mut matching: Vec<Record> = records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn patch(&self, id: &str, fields: Map<String, Value>) -> Result<Record> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))?;

        if record.fields.is_null() {
            record.fields = Value::Object(Map::new());
        }
        match &mut record.fields {
            Value::Object(existing) => existing.extend(fields),
            other => {
                return Err(RecordStoreError::InvalidPatch {
                    id: id.to_string(),
                    reason: format!("record fields are a {}, not a record", describe(other)),
                })
            }
        }
        Ok(record.clone())
    }
}
