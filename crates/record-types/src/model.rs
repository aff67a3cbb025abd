//! Record data model: records, edit history, and per-level approval entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WorkflowError;

/// Aggregate or per-level approval status.
///
/// Serialized as the Korean labels clients compare against; the lowercase
/// English names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[default]
    #[serde(rename = "대기", alias = "pending")]
    Pending,
    #[serde(rename = "승인", alias = "approved")]
    Approved,
    #[serde(rename = "반려", alias = "rejected")]
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "대기",
            ApprovalStatus::Approved => "승인",
            ApprovalStatus::Rejected => "반려",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision an approver can submit. `Pending` is never a valid decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// Parse a decision string (English or Korean label, case-insensitive).
    pub fn parse(s: &str) -> Result<Self, WorkflowError> {
        match s.trim().to_lowercase().as_str() {
            "approved" | "approve" | "승인" => Ok(Decision::Approved),
            "rejected" | "reject" | "반려" => Ok(Decision::Rejected),
            _ => Err(WorkflowError::Validation(format!(
                "invalid approval decision: {:?}",
                s
            ))),
        }
    }
}

impl From<Decision> for ApprovalStatus {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Approved => ApprovalStatus::Approved,
            Decision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

/// Already-authenticated caller, as handed over by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    /// Role name (e.g. "manager", "admin"). Empty means the default role.
    #[serde(default)]
    pub role: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }
}

/// Snapshot of a record's content taken right before an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub content: String,
    pub edited_at: DateTime<Utc>,
    pub edited_by: String,
}

/// Latest decision at one approval level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEntry {
    /// 1 = lowest authority; higher is more senior.
    pub level: u32,
    /// Whoever decided last at this level.
    pub user: String,
    pub approved_at: DateTime<Utc>,
    pub status: ApprovalStatus,
}

/// A versioned document tracked through the approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Oldest first. Append-only.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    /// At most one entry per level.
    #[serde(default)]
    pub approvers: Vec<ApprovalEntry>,
    /// Store revision; bumped on every successful replace.
    #[serde(default)]
    pub version: u64,
}

impl Record {
    /// New pending record with empty history and no approvers.
    pub fn new(
        id: String,
        title: String,
        content: String,
        regulation: Option<String>,
        tags: Vec<String>,
        created_by: String,
    ) -> Self {
        Self {
            id,
            title,
            content,
            regulation,
            tags,
            history: Vec::new(),
            created_by,
            created_at: Utc::now(),
            approval_status: ApprovalStatus::Pending,
            approvers: Vec::new(),
            version: 0,
        }
    }

    pub fn approver_at(&self, level: u32) -> Option<&ApprovalEntry> {
        self.approvers.iter().find(|a| a.level == level)
    }

    /// True if every tag in `tags` is present on the record.
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }
}
