//! Request and response DTOs for the record API.

use serde::{Deserialize, Serialize};

use crate::Record;

/// Create-record request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub regulation: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Partial update. Omitted or empty fields keep their prior value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub regulation: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl RecordChanges {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// Approval request body: `{ "status": "승인" | "반려" | "approved" | "rejected" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub status: String,
}

/// Listing filter. All set conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Exact match on `regulation`.
    pub regulation: Option<String>,
    /// Every listed tag must be present.
    pub tags: Option<Vec<String>>,
    /// Case-insensitive substring of `title`.
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(ref reg) = self.regulation {
            if record.regulation.as_deref() != Some(reg.as_str()) {
                return false;
            }
        }
        if let Some(ref tags) = self.tags {
            if !record.has_all_tags(tags) {
                return false;
            }
        }
        if let Some(ref needle) = self.search {
            if !record
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Base response envelope. `code` mirrors the HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponse<T> {
    #[serde(default = "default_code")]
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn default_code() -> i32 {
    200
}

impl<T> BaseResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data: Some(data),
        }
    }
}

pub type RecordResponse = BaseResponse<Record>;

pub type RecordListResponse = BaseResponse<Vec<Record>>;

/// Delete confirmation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedRecord {
    pub id: String,
    pub deleted: bool,
}

pub type DeleteResponse = BaseResponse<DeletedRecord>;
