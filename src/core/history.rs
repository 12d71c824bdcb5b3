//! History ledger.
//!
//! Append-only record of every terminal operation outcome, persisted as a
//! pretty JSON file. Record ids are monotonic and never reused; rollback
//! changes a record's status in place.

use crate::models::history::{HistoryFile, HistoryPage, HistoryRecord, HistoryStatus};
use crate::models::plan::{OperationKind, OutcomeStatus, PlanMode, PlannedOperation};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const LEDGER_VERSION: &str = "1.0";

/// History ledger, optionally backed by a file.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    path: Option<PathBuf>,
    file: HistoryFile,
}

impl HistoryLedger {
    /// Ledger that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            file: HistoryFile {
                version: LEDGER_VERSION.to_string(),
                next_id: 1,
                records: Vec::new(),
            },
        }
    }

    /// Open the ledger at `path`, starting empty when the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        let mut ledger = Self::in_memory();
        ledger.path = Some(path.to_path_buf());

        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut file: HistoryFile = serde_json::from_str(&content)?;
            let max_id = file.records.iter().map(|r| r.id).max().unwrap_or(0);
            file.next_id = file.next_id.max(max_id + 1);
            ledger.file = file;
            tracing::debug!(
                "Loaded {} history records from {}",
                ledger.file.records.len(),
                path.display()
            );
        }
        Ok(ledger)
    }

    /// Write the ledger back to its file. No-op for in-memory ledgers.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.file)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.file.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.records.is_empty()
    }

    /// Append the outcome of `operation`. Returns the new record id.
    ///
    /// Cancelled operations were never issued and are not recorded.
    pub fn append(
        &mut self,
        batch_id: &str,
        mode: PlanMode,
        operation: &PlannedOperation,
        status: &OutcomeStatus,
    ) -> Option<u64> {
        let (status, error_message) = match status {
            OutcomeStatus::Succeeded => (HistoryStatus::Success, None),
            OutcomeStatus::Failed { reason } => (HistoryStatus::Failed, Some(reason.clone())),
            OutcomeStatus::Cancelled => return None,
        };
        let id = self.file.next_id;
        self.file.next_id += 1;
        self.file.records.push(HistoryRecord {
            id,
            batch_id: batch_id.to_string(),
            mode,
            kind: operation.kind,
            original_path: operation.source.clone(),
            new_path: operation.destination.clone(),
            content: operation.content.clone(),
            media_type: operation.media_type,
            title: operation.title.clone(),
            status,
            error_message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
        Some(id)
    }

    pub fn get(&self, id: u64) -> Option<&HistoryRecord> {
        self.file.records.iter().find(|r| r.id == id)
    }

    /// Mark a record as rolled back.
    pub fn mark_rollback(&mut self, id: u64) -> Result<()> {
        let record = self
            .file
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(Error::HistoryRecordNotFound(id))?;
        record.status = HistoryStatus::Rollback;
        record.timestamp = chrono::Utc::now().to_rfc3339();
        Ok(())
    }

    /// Most-recent-first page of records (`page` is zero-based).
    pub fn page(&self, page: usize, per_page: usize) -> HistoryPage {
        let per_page = per_page.max(1);
        let mut ordered: Vec<&HistoryRecord> = self.file.records.iter().collect();
        ordered.sort_by(|a, b| b.id.cmp(&a.id));
        let records = ordered
            .into_iter()
            .skip(page.saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();
        HistoryPage {
            page,
            per_page,
            total: self.file.records.len(),
            records,
        }
    }

    /// Records of one batch, in id order.
    pub fn batch(&self, batch_id: &str) -> Vec<&HistoryRecord> {
        self.file
            .records
            .iter()
            .filter(|r| r.batch_id == batch_id)
            .collect()
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Reverse action of a successful record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reversal {
    /// Move `from` back to `to`.
    MoveBack { from: String, to: String },
    /// Remove the created file.
    Remove(String),
}

/// What undoing `record` takes.
pub fn reversal_of(record: &HistoryRecord) -> Result<Reversal> {
    if record.status != HistoryStatus::Success {
        return Err(Error::RollbackConflict(format!(
            "record {} is {}, only successful records can be rolled back",
            record.id, record.status
        )));
    }
    Ok(match record.kind {
        OperationKind::Move => Reversal::MoveBack {
            from: record.new_path.clone(),
            to: record.original_path.clone(),
        },
        OperationKind::Copy | OperationKind::CreatePointer => {
            Reversal::Remove(record.new_path.clone())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::MediaType;
    use crate::models::plan::FileRole;
    use tempfile::TempDir;

    const ORGANIZE: PlanMode = PlanMode::Organize;

    fn op(kind: OperationKind, n: usize) -> PlannedOperation {
        PlannedOperation {
            id: format!("op-{:04}", n),
            kind,
            role: FileRole::Video,
            source: format!("/src/{}.mkv", n),
            destination: format!("/dst/{}.mkv", n),
            content: None,
            media_type: MediaType::Tv,
            title: "Show".into(),
        }
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut ledger = HistoryLedger::in_memory();
        let a = ledger.append("b1", ORGANIZE, &op(OperationKind::Copy, 1), &OutcomeStatus::Succeeded);
        let b = ledger.append(
            "b1",
            ORGANIZE,
            &op(OperationKind::Copy, 2),
            &OutcomeStatus::Failed {
                reason: "boom".into(),
            },
        );
        let c = ledger.append("b1", ORGANIZE, &op(OperationKind::Copy, 3), &OutcomeStatus::Cancelled);
        assert_eq!(a, Some(1));
        assert_eq!(b, Some(2));
        assert_eq!(c, None);
        assert_eq!(ledger.get(2).unwrap().error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_page_is_most_recent_first() {
        let mut ledger = HistoryLedger::in_memory();
        for n in 1..=5 {
            ledger.append("b", ORGANIZE, &op(OperationKind::Move, n), &OutcomeStatus::Succeeded);
        }
        let first = ledger.page(0, 2);
        let ids: Vec<u64> = first.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 4]);
        assert!(first.has_more());
        let last = ledger.page(2, 2);
        assert_eq!(last.records.len(), 1);
        assert!(!last.has_more());
    }

    #[test]
    fn test_rollback_in_place() {
        let mut ledger = HistoryLedger::in_memory();
        let id = ledger
            .append("b", ORGANIZE, &op(OperationKind::Move, 1), &OutcomeStatus::Succeeded)
            .unwrap();
        assert_eq!(
            reversal_of(ledger.get(id).unwrap()).unwrap(),
            Reversal::MoveBack {
                from: "/dst/1.mkv".into(),
                to: "/src/1.mkv".into()
            }
        );
        ledger.mark_rollback(id).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(id).unwrap().status, HistoryStatus::Rollback);
        assert!(reversal_of(ledger.get(id).unwrap()).is_err());
        assert!(matches!(
            ledger.mark_rollback(99),
            Err(Error::HistoryRecordNotFound(99))
        ));
    }

    #[test]
    fn test_save_and_reopen_keeps_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/history.json");

        let mut ledger = HistoryLedger::open(&path).unwrap();
        ledger.append("b", ORGANIZE, &op(OperationKind::Copy, 1), &OutcomeStatus::Succeeded);
        ledger.save().unwrap();

        let mut reopened = HistoryLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        let id = reopened.append("c", ORGANIZE, &op(OperationKind::Copy, 2), &OutcomeStatus::Succeeded);
        assert_eq!(id, Some(2));
    }
}
