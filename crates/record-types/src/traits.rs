//! Traits for the record store and workflow service.

use crate::{Actor, CreateRecordRequest, Record, RecordChanges, RecordFilter};
use async_trait::async_trait;

/// Keyed, versioned record store.
///
/// Contract: `insert` stores the record at version 0. `replace` is a
/// compare-and-swap on `version`: it succeeds only when the stored version equals
/// `expected_version`, and the stored (and returned) record then carries
/// `expected_version + 1`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the id already exists.
    async fn insert(&self, record: Record) -> Result<Record, StoreError>;

    /// Get one record by id.
    async fn get(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// List records matching the filter, oldest first.
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>, StoreError>;

    /// Conditionally replace the whole record.
    async fn replace(&self, record: Record, expected_version: u64) -> Result<Record, StoreError>;

    /// Delete by id. Fails with `NotFound` if absent.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Record workflow surface: CRUD plus edit history and approvals.
#[async_trait]
pub trait RecordWorkflow: Send + Sync {
    async fn create_record(
        &self,
        req: &CreateRecordRequest,
        actor: &Actor,
    ) -> Result<Record, WorkflowError>;

    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<Record>, WorkflowError>;

    async fn get_record(&self, id: &str) -> Result<Record, WorkflowError>;

    /// Append a history entry for the current content, then apply `changes`.
    async fn submit_edit(
        &self,
        id: &str,
        actor: &Actor,
        changes: &RecordChanges,
    ) -> Result<Record, WorkflowError>;

    /// Record `decision` at the actor's approval level and recompute status.
    async fn submit_approval(
        &self,
        id: &str,
        actor: &Actor,
        decision: &str,
    ) -> Result<Record, WorkflowError>;

    async fn delete_record(&self, id: &str) -> Result<(), WorkflowError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("version conflict on record {id}: expected {expected}, found {found}")]
    Conflict {
        id: String,
        expected: u64,
        found: u64,
    },
    #[error("record store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("persistence: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => WorkflowError::NotFound(format!("record not found: {}", id)),
            StoreError::Conflict { .. } => WorkflowError::Conflict(e.to_string()),
            other => WorkflowError::Persistence(other),
        }
    }
}
