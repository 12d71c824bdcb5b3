//! Integration tests for artifact and ledger files.
//!
//! Tests cover:
//! - Plan save/load
//! - Batch report save/load
//! - History ledger persistence and pagination

use std::collections::HashSet;
use strm_organizer::core::executor::{load_report, save_report};
use strm_organizer::core::history::HistoryLedger;
use strm_organizer::core::planner::{load_plan, save_plan};
use strm_organizer::models::media::MediaType;
use strm_organizer::models::plan::{
    BatchReport, FileRole, OperationKind, OperationOutcome, OutcomeStatus, Plan, PlanMode,
    PlannedOperation,
};
use strm_organizer::Error;
use tempfile::TempDir;

fn pointer_op(n: usize) -> PlannedOperation {
    PlannedOperation {
        id: format!("op-{:04}", n),
        kind: OperationKind::CreatePointer,
        role: FileRole::Video,
        source: format!("/Show/E{:02}.mkv", n),
        destination: format!("/strm/Show/Season 01/Show S01E{:02}.strm", n),
        content: Some(format!("http://host/d/Show/E{:02}.mkv", n)),
        media_type: MediaType::Tv,
        title: "Show".into(),
    }
}

// ========== PLAN I/O TESTS ==========

#[test]
fn test_save_and_load_plan() {
    let plan = Plan {
        mode: PlanMode::Pointer,
        target_root: "/strm".into(),
        operations: vec![pointer_op(1), pointer_op(2)],
        conflicts: vec![],
    };

    let temp_dir = TempDir::new().unwrap();
    let plan_path = temp_dir.path().join("out/plan.json");

    save_plan(&plan, &plan_path).unwrap();
    assert!(plan_path.exists());
    assert_eq!(load_plan(&plan_path).unwrap(), plan);
}

#[test]
fn test_load_invalid_plan() {
    let temp_dir = TempDir::new().unwrap();
    let plan_path = temp_dir.path().join("plan.json");
    std::fs::write(&plan_path, r#"{"mode": "sideways"}"#).unwrap();
    assert!(matches!(
        load_plan(&plan_path),
        Err(Error::InvalidPlanFile(_))
    ));
}

#[test]
fn test_load_nonexistent_plan() {
    assert!(load_plan(std::path::Path::new("/nonexistent/plan.json")).is_err());
}

// ========== REPORT I/O TESTS ==========

#[test]
fn test_report_round_trip_keeps_statuses() {
    let report = BatchReport {
        batch_id: "batch-1".into(),
        mode: PlanMode::Pointer,
        target_root: "/strm".into(),
        started_at: "2024-01-01T00:00:00Z".into(),
        finished_at: "2024-01-01T00:01:00Z".into(),
        outcomes: vec![
            OperationOutcome {
                operation: pointer_op(1),
                status: OutcomeStatus::Succeeded,
                history_id: Some(1),
            },
            OperationOutcome {
                operation: pointer_op(2),
                status: OutcomeStatus::Failed {
                    reason: "timeout".into(),
                },
                history_id: Some(2),
            },
            OperationOutcome {
                operation: pointer_op(3),
                status: OutcomeStatus::Cancelled,
                history_id: None,
            },
        ],
    };

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.json");
    save_report(&report, &path).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains(r#""status": "failed""#));
    assert!(raw.contains(r#""reason": "timeout""#));

    let loaded = load_report(&path).unwrap();
    assert_eq!(loaded, report);
    assert_eq!(loaded.retryable().len(), 2);
}

// ========== HISTORY TESTS ==========

#[test]
fn test_history_pages_are_stable() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("history.json");

    let mut ledger = HistoryLedger::open(&path).unwrap();
    for n in 1..=23 {
        let status = if n % 5 == 0 {
            OutcomeStatus::Failed {
                reason: "boom".into(),
            }
        } else {
            OutcomeStatus::Succeeded
        };
        ledger.append("batch", PlanMode::Pointer, &pointer_op(n), &status);
    }
    ledger.save().unwrap();

    let reopened = HistoryLedger::open(&path).unwrap();
    let mut seen = Vec::new();
    let mut page = 0;
    loop {
        let result = reopened.page(page, 10);
        assert_eq!(result.total, 23);
        assert_eq!(result.records, ledger.page(page, 10).records);
        seen.extend(result.records.iter().map(|r| r.id));
        if !result.has_more() {
            break;
        }
        page += 1;
    }

    assert_eq!(page, 2);
    let expected: Vec<u64> = (1..=23).rev().collect();
    assert_eq!(seen, expected);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 23);
    assert!(reopened.page(3, 10).records.is_empty());
}

#[test]
fn test_history_rollback_persists() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("history.json");

    let mut ledger = HistoryLedger::open(&path).unwrap();
    let id = ledger
        .append("batch", PlanMode::Pointer, &pointer_op(1), &OutcomeStatus::Succeeded)
        .unwrap();
    ledger.mark_rollback(id).unwrap();
    ledger.save().unwrap();

    let reopened = HistoryLedger::open(&path).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(
        reopened.get(id).unwrap().status,
        strm_organizer::models::history::HistoryStatus::Rollback
    );
}
