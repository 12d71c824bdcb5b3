//! Stage progress events.

use serde::{Deserialize, Serialize};

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Scan,
    Classify,
    Plan,
    Execute,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Scan => write!(f, "scan"),
            Stage::Classify => write!(f, "classify"),
            Stage::Plan => write!(f, "plan"),
            Stage::Execute => write!(f, "execute"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Idle,
    Executing,
    Complete,
    Error,
}

/// A progress snapshot for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub status: StageStatus,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl StageEvent {
    pub fn new(stage: Stage, status: StageStatus, current: usize, total: usize) -> Self {
        Self {
            stage,
            status,
            current,
            total,
            message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
