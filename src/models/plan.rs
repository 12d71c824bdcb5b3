//! Plan and execution report data models.

use super::media::MediaType;
use serde::{Deserialize, Serialize};

/// Output mode of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    /// Move or copy the media into the library layout.
    Organize,
    /// Write `.strm` pointer files into the library layout.
    Pointer,
}

impl std::fmt::Display for PlanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanMode::Organize => write!(f, "organize"),
            PlanMode::Pointer => write!(f, "pointer"),
        }
    }
}

/// Operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Copy,
    Move,
    CreatePointer,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Copy => write!(f, "copy"),
            OperationKind::Move => write!(f, "move"),
            OperationKind::CreatePointer => write!(f, "create_pointer"),
        }
    }
}

/// What the operation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Video,
    Subtitle,
    /// Untagged duplicate of the preferred subtitle.
    DefaultSubtitle,
}

/// A single storage operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOperation {
    /// Stable id within the plan (`op-0001`, ...).
    pub id: String,
    pub kind: OperationKind,
    pub role: FileRole,
    pub source: String,
    pub destination: String,
    /// Pointer file content, only for `create_pointer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub media_type: MediaType,
    pub title: String,
}

/// Two operations aiming at one destination; the later one is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConflict {
    pub source: String,
    pub destination: String,
    pub reason: String,
}

/// Plan file structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub mode: PlanMode,
    /// Target root the destinations live under.
    pub target_root: String,
    pub operations: Vec<PlannedOperation>,
    #[serde(default)]
    pub conflicts: Vec<PlanConflict>,
}

impl Plan {
    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.kind == kind).count()
    }
}

/// Terminal state of one operation in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeStatus {
    Succeeded,
    Failed { reason: String },
    /// Never issued because the batch was cancelled.
    Cancelled,
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Succeeded)
    }

    /// Failed and cancelled operations may be retried.
    pub fn is_retryable(&self) -> bool {
        !self.is_success()
    }
}

/// One operation and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub operation: PlannedOperation,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// History record written for this outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<u64>,
}

/// Per-operation status list plus aggregate counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub mode: PlanMode,
    /// Root every destination must stay under.
    pub target_root: String,
    pub started_at: String,
    pub finished_at: String,
    pub outcomes: Vec<OperationOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed { .. }))
            .count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Cancelled)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    /// The plan this batch was run from.
    pub fn plan(&self) -> Plan {
        Plan {
            mode: self.mode,
            target_root: self.target_root.clone(),
            operations: self.outcomes.iter().map(|o| o.operation.clone()).collect(),
            conflicts: Vec::new(),
        }
    }

    /// Operations that a retry would attempt.
    pub fn retryable(&self) -> Vec<&PlannedOperation> {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_retryable())
            .map(|o| &o.operation)
            .collect()
    }
}
