//! History ledger data model.

use super::media::MediaType;
use super::plan::{OperationKind, PlanMode};
use serde::{Deserialize, Serialize};

/// Terminal status of a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Success,
    Failed,
    Rollback,
}

impl std::fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryStatus::Success => write!(f, "success"),
            HistoryStatus::Failed => write!(f, "failed"),
            HistoryStatus::Rollback => write!(f, "rollback"),
        }
    }
}

/// One applied operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Monotonic record id, assigned by the ledger.
    pub id: u64,
    /// Batch that produced the record.
    pub batch_id: String,
    /// Mode of the plan; organize records live on the source storage.
    pub mode: PlanMode,
    pub kind: OperationKind,
    pub original_path: String,
    pub new_path: String,
    /// Pointer content for `create_pointer` records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub media_type: MediaType,
    pub title: String,
    pub status: HistoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// RFC 3339 timestamp of the last status change.
    pub timestamp: String,
}

/// Ledger file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFile {
    pub version: String,
    pub next_id: u64,
    pub records: Vec<HistoryRecord>,
}

/// One page of a most-recent-first query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    /// Zero-based page number.
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub records: Vec<HistoryRecord>,
}

impl HistoryPage {
    pub fn has_more(&self) -> bool {
        (self.page + 1) * self.per_page < self.total
    }
}
