//! WorkflowService: record CRUD plus edit and approval against a versioned store.

use crate::approval::{decide, ApprovalPolicy, LevelPolicy};
use crate::ledger::record_edit;
use chrono::Utc;
use record_types::*;
use uuid::Uuid;

/// Workflow that composes a record store with the level and approval policies.
///
/// Each mutation loads the record, changes it in memory, and writes it back
/// conditioned on the version it read. A concurrent write in between surfaces as
/// `WorkflowError::Conflict`; the caller decides whether to retry.
pub struct WorkflowService<S> {
    pub store: S,
    pub levels: LevelPolicy,
    pub approval: ApprovalPolicy,
}

impl<S> WorkflowService<S>
where
    S: RecordStore + Send + Sync,
{
    /// Service with the standard level table and all of its levels required.
    pub fn new(store: S) -> Self {
        Self::with_policies(store, LevelPolicy::standard(), ApprovalPolicy::default())
    }

    pub fn with_policies(store: S, levels: LevelPolicy, approval: ApprovalPolicy) -> Self {
        Self {
            store,
            levels,
            approval,
        }
    }

    fn required_text(value: &Option<String>, field: &str) -> Result<String, WorkflowError> {
        match value.as_deref() {
            Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
            _ => Err(WorkflowError::Validation(format!("{} is required", field))),
        }
    }

    async fn load(&self, id: &str) -> Result<Record, WorkflowError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("record not found: {}", id)))
    }

    async fn persist(&self, record: Record, read_version: u64) -> Result<Record, WorkflowError> {
        let id = record.id.clone();
        self.store
            .replace(record, read_version)
            .await
            .map_err(|e| {
                if let StoreError::Conflict { found, .. } = &e {
                    tracing::warn!(record_id = %id, read_version, found, "record changed concurrently");
                }
                WorkflowError::from(e)
            })
    }
}

#[async_trait::async_trait]
impl<S> RecordWorkflow for WorkflowService<S>
where
    S: RecordStore + Send + Sync,
{
    async fn create_record(
        &self,
        req: &CreateRecordRequest,
        actor: &Actor,
    ) -> Result<Record, WorkflowError> {
        let title = Self::required_text(&req.title, "title")?;
        let content = Self::required_text(&req.content, "content")?;
        let regulation = req.regulation.clone().filter(|r| !r.is_empty());
        let tags = req.tags.clone().unwrap_or_default();

        let record = Record::new(
            Uuid::new_v4().to_string(),
            title,
            content,
            regulation,
            tags,
            actor.id.clone(),
        );
        let record = self.store.insert(record).await?;
        tracing::info!(record_id = %record.id, actor = %actor.id, "record created");
        Ok(record)
    }

    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<Record>, WorkflowError> {
        Ok(self.store.list(filter).await?)
    }

    async fn get_record(&self, id: &str) -> Result<Record, WorkflowError> {
        self.load(id).await
    }

    async fn submit_edit(
        &self,
        id: &str,
        actor: &Actor,
        changes: &RecordChanges,
    ) -> Result<Record, WorkflowError> {
        let mut record = self.load(id).await?;
        let read_version = record.version;
        record_edit(&mut record, actor, changes, Utc::now());
        let record = self.persist(record, read_version).await?;
        tracing::info!(
            record_id = %record.id,
            actor = %actor.id,
            history_len = record.history.len(),
            "record edited"
        );
        Ok(record)
    }

    async fn submit_approval(
        &self,
        id: &str,
        actor: &Actor,
        decision: &str,
    ) -> Result<Record, WorkflowError> {
        let decision = Decision::parse(decision)?;
        let mut record = self.load(id).await?;
        let read_version = record.version;
        let level = self.levels.level_for(&actor.role);
        decide(&mut record, actor, level, decision, &self.approval, Utc::now());
        let record = self.persist(record, read_version).await?;
        tracing::info!(
            record_id = %record.id,
            actor = %actor.id,
            level,
            decision = ?decision,
            status = %record.approval_status,
            "approval recorded"
        );
        Ok(record)
    }

    async fn delete_record(&self, id: &str) -> Result<(), WorkflowError> {
        self.store.delete(id).await?;
        tracing::info!(record_id = %id, "record deleted");
        Ok(())
    }
}
