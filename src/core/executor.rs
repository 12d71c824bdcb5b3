//! Plan execution module.
//!
//! Applies planned operations one at a time against storage, waiting the
//! configured upload delay between writes. A failing operation never stops
//! the batch; every terminal outcome goes to the history ledger.

use crate::core::history::{reversal_of, HistoryLedger, Reversal};
use crate::core::progress::ProgressBus;
use crate::models::config::Config;
use crate::models::history::HistoryRecord;
use crate::models::plan::{
    BatchReport, OperationKind, OperationOutcome, OutcomeStatus, Plan, PlanMode,
    PlannedOperation,
};
use crate::models::progress::Stage;
use crate::services::storage::Storage;
use crate::utils::path as spath;
use crate::{Error, Result};
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Executor configuration.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Pause between consecutive write operations.
    pub upload_delay: Duration,
}

impl From<&Config> for ExecutorConfig {
    fn from(config: &Config) -> Self {
        Self {
            upload_delay: config.upload_delay(),
        }
    }
}

/// Plan executor.
///
/// Organize plans run against the source storage. Pointer plans write into
/// `target` when one is set; copies then go through read and write.
pub struct Executor {
    source: Arc<dyn Storage>,
    target: Option<Arc<dyn Storage>>,
    config: ExecutorConfig,
    progress: ProgressBus,
    batch_lock: Mutex<()>,
}

impl Executor {
    /// Create an executor working on a single storage.
    pub fn new(source: Arc<dyn Storage>) -> Self {
        Self {
            source,
            target: None,
            config: ExecutorConfig::default(),
            progress: ProgressBus::default(),
            batch_lock: Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Write destinations into a different storage.
    pub fn with_target(mut self, target: Arc<dyn Storage>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_progress(mut self, progress: ProgressBus) -> Self {
        self.progress = progress;
        self
    }

    fn destination_storage(&self) -> &dyn Storage {
        self.target.as_deref().unwrap_or(self.source.as_ref())
    }

    /// Storage holding the output of `record`. Organize output always lives
    /// on the source storage.
    fn record_storage(&self, record: &HistoryRecord) -> &dyn Storage {
        match record.mode {
            PlanMode::Organize => self.source.as_ref(),
            PlanMode::Pointer => self.destination_storage(),
        }
    }

    /// Check a plan before execution.
    pub fn validate(&self, plan: &Plan) -> Result<()> {
        let root = spath::normalize(&plan.target_root);
        let mut destinations = HashSet::new();
        let mut errors = Vec::new();

        for op in &plan.operations {
            if !destinations.insert(op.destination.as_str()) {
                errors.push(format!("{}: duplicate destination {}", op.id, op.destination));
            }
            if spath::strip_root(&op.destination, &root).is_none() {
                errors.push(format!("{}: {} is outside {}", op.id, op.destination, root));
            }
            if op.kind == OperationKind::CreatePointer && op.content.is_none() {
                errors.push(format!("{}: pointer without content", op.id));
            }
        }

        if !errors.is_empty() {
            for error in &errors {
                tracing::error!("{}", error);
            }
            let message = format!("{} errors found", errors.len());
            self.progress
                .error(Stage::Execute, format!("Plan rejected: {}", message));
            return Err(Error::InvalidPlanFile(message));
        }
        Ok(())
    }

    /// Apply every operation of `plan`.
    ///
    /// Fails fast with [`Error::ExecutorBusy`] while another batch runs on
    /// this executor.
    pub async fn apply(
        &self,
        plan: &Plan,
        ledger: &mut HistoryLedger,
        cancel: Option<&CancellationToken>,
    ) -> Result<BatchReport> {
        let _guard = self.batch_lock.try_lock().map_err(|_| Error::ExecutorBusy)?;
        self.validate(plan)?;

        let batch_id = Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().to_rfc3339();
        tracing::info!(
            "Applying {} operations (batch {})",
            plan.operations.len(),
            batch_id
        );

        let outcomes = self
            .run(&batch_id, plan.mode, &plan.operations, ledger, cancel)
            .await;

        Ok(BatchReport {
            batch_id,
            mode: plan.mode,
            target_root: plan.target_root.clone(),
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            outcomes,
        })
    }

    /// Re-attempt the failed and cancelled operations of a batch.
    ///
    /// Succeeded outcomes are carried over untouched; operation order is
    /// preserved.
    pub async fn retry(
        &self,
        report: &BatchReport,
        ledger: &mut HistoryLedger,
        cancel: Option<&CancellationToken>,
    ) -> Result<BatchReport> {
        let _guard = self.batch_lock.try_lock().map_err(|_| Error::ExecutorBusy)?;
        self.validate(&report.plan())?;

        let pending: Vec<PlannedOperation> =
            report.retryable().into_iter().cloned().collect();
        tracing::info!(
            "Retrying {} of {} operations (batch {})",
            pending.len(),
            report.outcomes.len(),
            report.batch_id
        );

        let mut retried = self
            .run(&report.batch_id, report.mode, &pending, ledger, cancel)
            .await
            .into_iter();

        let outcomes = report
            .outcomes
            .iter()
            .map(|previous| {
                if previous.status.is_success() {
                    return previous.clone();
                }
                retried.next().unwrap_or_else(|| previous.clone())
            })
            .collect();

        Ok(BatchReport {
            batch_id: report.batch_id.clone(),
            mode: report.mode,
            target_root: report.target_root.clone(),
            started_at: report.started_at.clone(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            outcomes,
        })
    }

    async fn run(
        &self,
        batch_id: &str,
        mode: PlanMode,
        operations: &[PlannedOperation],
        ledger: &mut HistoryLedger,
        cancel: Option<&CancellationToken>,
    ) -> Vec<OperationOutcome> {
        let total = operations.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut success_count = 0;
        let mut error_count = 0;
        let is_cancelled = || cancel.is_some_and(|token| token.is_cancelled());

        for (idx, op) in operations.iter().enumerate() {
            if idx > 0 && !is_cancelled() {
                self.pause(cancel).await;
            }
            if is_cancelled() {
                outcomes.push(OperationOutcome {
                    operation: op.clone(),
                    status: OutcomeStatus::Cancelled,
                    history_id: None,
                });
                continue;
            }

            self.progress
                .executing(Stage::Execute, idx, total, op.destination.clone());

            let status = match self.perform(op).await {
                Ok(()) => {
                    tracing::debug!("{} {} -> {}", op.kind, op.source, op.destination);
                    success_count += 1;
                    OutcomeStatus::Succeeded
                }
                Err(e) => {
                    tracing::error!("Failed to {} {}: {}", op.kind, op.source, e);
                    error_count += 1;
                    OutcomeStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            let history_id = ledger.append(batch_id, mode, op, &status);
            outcomes.push(OperationOutcome {
                operation: op.clone(),
                status,
                history_id,
            });
        }

        let cancelled = total - success_count - error_count;
        if cancelled > 0 {
            tracing::warn!("Batch cancelled, {} operations not issued", cancelled);
        }
        self.progress.complete(
            Stage::Execute,
            total,
            format!("{} succeeded, {} failed", success_count, error_count),
        );
        outcomes
    }

    async fn pause(&self, cancel: Option<&CancellationToken>) {
        let delay = self.config.upload_delay;
        if delay.is_zero() {
            return;
        }
        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
    }

    async fn ensure_free(&self, storage: &dyn Storage, path: &str) -> Result<()> {
        if storage.exists(path).await? {
            return Err(Error::FileAlreadyExists(path.to_string()));
        }
        Ok(())
    }

    /// Perform a single operation.
    async fn perform(&self, op: &PlannedOperation) -> Result<()> {
        match (op.kind, &self.target) {
            (OperationKind::Move, None) => self.source.rename(&op.source, &op.destination).await,
            (OperationKind::Move, Some(target)) => {
                self.ensure_free(target.as_ref(), &op.destination).await?;
                let bytes = self.source.read(&op.source).await?;
                target.write(&op.destination, &bytes).await?;
                self.source.remove(&op.source).await
            }
            (OperationKind::Copy, None) => self.source.copy(&op.source, &op.destination).await,
            (OperationKind::Copy, Some(target)) => {
                self.ensure_free(target.as_ref(), &op.destination).await?;
                let bytes = self.source.read(&op.source).await?;
                target.write(&op.destination, &bytes).await
            }
            (OperationKind::CreatePointer, _) => {
                let content = op
                    .content
                    .as_deref()
                    .ok_or_else(|| Error::other(format!("{} has no pointer content", op.id)))?;
                let target = self.destination_storage();
                self.ensure_free(target, &op.destination).await?;
                target.write(&op.destination, content.as_bytes()).await
            }
        }
    }

    /// Undo one successful history record and mark it rolled back.
    ///
    /// The record's plan mode picks the storage: organize records are undone
    /// on the source storage even when a target is set.
    pub async fn rollback(&self, record_id: u64, ledger: &mut HistoryLedger) -> Result<Reversal> {
        let record = ledger
            .get(record_id)
            .ok_or(Error::HistoryRecordNotFound(record_id))?;
        let reversal = reversal_of(record)?;
        let storage = self.record_storage(record);

        match &reversal {
            Reversal::MoveBack { from, to } => match (record.mode, &self.target) {
                (PlanMode::Pointer, Some(target)) => {
                    self.ensure_free(self.source.as_ref(), to).await?;
                    let bytes = target.read(from).await?;
                    self.source.write(to, &bytes).await?;
                    target.remove(from).await?;
                }
                _ => self.source.rename(from, to).await?,
            },
            Reversal::Remove(path) => storage.remove(path).await?,
        }

        ledger.mark_rollback(record_id)?;
        tracing::info!("Rolled back record {}", record_id);
        Ok(reversal)
    }

    /// Undo every successful record of a batch, newest first.
    ///
    /// Returns the ids rolled back and the ids that failed with their error.
    pub async fn rollback_batch(
        &self,
        batch_id: &str,
        ledger: &mut HistoryLedger,
    ) -> (Vec<u64>, Vec<(u64, Error)>) {
        let mut ids: Vec<u64> = ledger
            .batch(batch_id)
            .into_iter()
            .filter(|r| reversal_of(r).is_ok())
            .map(|r| r.id)
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut done = Vec::new();
        let mut failed = Vec::new();
        for id in ids {
            match self.rollback(id, ledger).await {
                Ok(_) => done.push(id),
                Err(e) => {
                    tracing::error!("Rollback of record {} failed: {}", id, e);
                    failed.push((id, e));
                }
            }
        }
        (done, failed)
    }
}

/// Print the aggregate counts of a batch.
pub fn print_summary(report: &BatchReport) {
    println!();
    println!("{}", "[Execution Summary]".bold().green());
    println!("  {} {}", "Batch:".bold(), report.batch_id);
    println!("  {} {}", "Successful operations:".bold(), report.succeeded());
    println!("  {} {}", "Failed operations:".bold(), report.failed());
    if report.cancelled() > 0 {
        println!("  {} {}", "Cancelled operations:".bold(), report.cancelled());
    }
    for outcome in &report.outcomes {
        if let OutcomeStatus::Failed { reason } = &outcome.status {
            println!(
                "  {} {} {}",
                "-".red(),
                outcome.operation.source,
                format!("({})", reason).dimmed()
            );
        }
    }
    println!();
}

/// Load a batch report file.
pub fn load_report(path: &Path) -> Result<BatchReport> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Save a batch report file.
pub fn save_report(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::MediaType;
    use crate::models::plan::{FileRole, PlanMode};
    use crate::services::memory::MemoryStorage;

    fn op(n: usize, kind: OperationKind) -> PlannedOperation {
        PlannedOperation {
            id: format!("op-{:04}", n),
            kind,
            role: FileRole::Video,
            source: format!("/in/{}.mkv", n),
            destination: format!("/lib/{}.mkv", n),
            content: None,
            media_type: MediaType::Movie,
            title: "Film".into(),
        }
    }

    fn plan(ops: Vec<PlannedOperation>) -> Plan {
        Plan {
            mode: PlanMode::Organize,
            target_root: "/lib".into(),
            operations: ops,
            conflicts: vec![],
        }
    }

    #[test]
    fn test_validate_rejects_escaping_destination() {
        let executor = Executor::new(Arc::new(MemoryStorage::new()));
        let mut bad = op(1, OperationKind::Copy);
        bad.destination = "/elsewhere/1.mkv".into();
        assert!(executor.validate(&plan(vec![bad])).is_err());
        assert!(executor.validate(&plan(vec![op(1, OperationKind::Copy)])).is_ok());
    }

    #[test]
    fn test_rejected_plan_publishes_error() {
        let bus = ProgressBus::default();
        let mut receiver = bus.subscribe();
        let executor = Executor::new(Arc::new(MemoryStorage::new())).with_progress(bus.clone());
        let mut first = op(1, OperationKind::Copy);
        first.destination = "/lib/same.mkv".into();
        let mut second = op(2, OperationKind::Copy);
        second.destination = "/lib/same.mkv".into();

        assert!(matches!(
            executor.validate(&plan(vec![first, second])),
            Err(Error::InvalidPlanFile(_))
        ));
        let event = receiver.try_recv().unwrap();
        assert_eq!(event.stage, Stage::Execute);
        assert_eq!(event.status, crate::models::progress::StageStatus::Error);
        assert_eq!(event.message, "Plan rejected: 1 errors found");
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_file("/in/1.mkv", 4);
        storage.add_file("/in/2.mkv", 4);
        storage.fail_on("/in/1.mkv");
        let executor = Executor::new(storage.clone());
        let mut ledger = HistoryLedger::in_memory();

        let report = executor
            .apply(
                &plan(vec![op(1, OperationKind::Move), op(2, OperationKind::Move)]),
                &mut ledger,
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(storage.contains("/lib/2.mkv"));
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn test_pointer_written_to_target() {
        let source = Arc::new(MemoryStorage::new());
        let target = Arc::new(MemoryStorage::new());
        let mut pointer = op(1, OperationKind::CreatePointer);
        pointer.destination = "/lib/1.strm".into();
        pointer.content = Some("http://host/d/in/1.mkv".into());
        let executor = Executor::new(source.clone()).with_target(target.clone());

        let report = executor
            .apply(&plan(vec![pointer]), &mut HistoryLedger::in_memory(), None)
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(
            target.get("/lib/1.strm").unwrap(),
            b"http://host/d/in/1.mkv".to_vec()
        );
        assert!(source.operations().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_move() {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_file("/in/1.mkv", 4);
        let executor = Executor::new(storage.clone());
        let mut ledger = HistoryLedger::in_memory();

        let report = executor
            .apply(&plan(vec![op(1, OperationKind::Move)]), &mut ledger, None)
            .await
            .unwrap();
        let id = report.outcomes[0].history_id.unwrap();

        executor.rollback(id, &mut ledger).await.unwrap();
        assert!(storage.contains("/in/1.mkv"));
        assert!(!storage.contains("/lib/1.mkv"));
        assert!(matches!(
            executor.rollback(id, &mut ledger).await,
            Err(Error::RollbackConflict(_))
        ));
    }
}
