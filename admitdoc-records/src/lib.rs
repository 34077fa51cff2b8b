//! Record storage seam for the admitdoc backend.
//!
//! Render jobs carry only a record id; the renderer re-reads the record at
//! render time so a job always sees the latest data. This crate keeps that
//! seam narrow: a [`RecordStore`] trait plus an in-memory implementation
//! shared by the server and the tests. There is deliberately no persistence
//! schema here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A submitted admission record. The business payload stays opaque; the
/// renderer only needs a name, a program and whatever extra fields the form
/// collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRecord {
    pub id: Uuid,
    pub applicant_name: String,
    pub program: String,
    #[serde(default)]
    pub fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdmissionRecord {
    /// Build a fresh record with a generated id.
    pub fn new(
        applicant_name: impl Into<String>,
        program: impl Into<String>,
        fields: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            applicant_name: applicant_name.into(),
            program: program.into(),
            fields,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Errors surfaced by record store backends.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("record store backend is unavailable: {0}")]
    Unavailable(String),
}

/// Trait for record storage backends. Implement this for production stores;
/// the in-memory variant below covers the server default and the tests.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record by id, `None` when it does not exist.
    async fn get(&self, id: Uuid) -> Result<Option<AdmissionRecord>, RecordStoreError>;

    /// Insert or replace a record. The stored copy gets a fresh
    /// `updated_at` stamp and is returned to the caller.
    async fn upsert(&self, record: AdmissionRecord) -> Result<AdmissionRecord, RecordStoreError>;
}

/// In-memory record store.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<Uuid, AdmissionRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, id: Uuid) -> Result<Option<AdmissionRecord>, RecordStoreError> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn upsert(&self, mut record: AdmissionRecord) -> Result<AdmissionRecord, RecordStoreError> {
        record.updated_at = Utc::now();
        let mut records = self.records.write().await;
        records.insert(record.id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn upsert_then_get_roundtrip() {
        let store = InMemoryRecordStore::new();
        let record = AdmissionRecord::new("Ada Lovelace", "mathematics", json!({"year": 1840}));
        let id = record.id;

        let stored = store.upsert(record).await.expect("upsert");
        assert_eq!(stored.id, id);

        let fetched = store.get(id).await.expect("get").expect("present");
        assert_eq!(fetched.applicant_name, "Ada Lovelace");
        assert_eq!(fetched.fields["year"], 1840);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryRecordStore::new();
        let found = store.get(Uuid::new_v4()).await.expect("get");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_and_bumps_updated_at() {
        let store = InMemoryRecordStore::new();
        let record = AdmissionRecord::new("Grace Hopper", "compilers", Value::Null);
        let id = record.id;
        let first = store.upsert(record).await.expect("first upsert");

        let mut changed = first.clone();
        changed.program = "navy".to_string();
        let second = store.upsert(changed).await.expect("second upsert");

        assert!(second.updated_at >= first.updated_at);
        let fetched = store.get(id).await.expect("get").expect("present");
        assert_eq!(fetched.program, "navy");
        assert_eq!(store.len().await, 1);
    }
}
