//! Record workflow: edit history, per-level approvals, and the service that
//! applies both against a versioned record store.

mod approval;
mod ledger;
mod service;

pub use approval::{decide, derive_status, upsert_decision, ApprovalPolicy, LevelPolicy};
pub use ledger::record_edit;
pub use record_types::WorkflowError;
pub use service::WorkflowService;
