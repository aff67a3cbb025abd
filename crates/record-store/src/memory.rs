//! In-memory record store with versioned compare-and-swap.

use record_types::{Record, RecordFilter, RecordStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of RecordStore (process lifetime only).
/// Records are keyed by id; the version check and write happen under one write lock.
pub struct InMemoryRecordStore {
    /// record_id -> record.
    records: Arc<RwLock<HashMap<String, Record>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, mut record: Record) -> Result<Record, StoreError> {
        let mut guard = self.records.write().await;
        if let Some(existing) = guard.get(&record.id) {
            return Err(StoreError::Conflict {
                id: record.id.clone(),
                expected: 0,
                found: existing.version,
            });
        }
        record.version = 0;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let guard = self.records.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        let guard = self.records.read().await;
        let mut out: Vec<Record> = guard
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        crate::sort_records(&mut out);
        Ok(out)
    }

    async fn replace(&self, mut record: Record, expected_version: u64) -> Result<Record, StoreError> {
        let mut guard = self.records.write().await;
        let current = guard
            .get(&record.id)
            .ok_or_else(|| StoreError::NotFound(record.id.clone()))?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                id: record.id.clone(),
                expected: expected_version,
                found: current.version,
            });
        }
        record.version = expected_version + 1;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut guard = self.records.write().await;
        guard
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
