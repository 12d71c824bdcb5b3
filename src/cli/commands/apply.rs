//! Apply command implementation.
//!
//! Reads a plan file, applies every operation and writes a batch report that
//! `retry` can pick up.

use crate::cli::{progress, Context};
use crate::core::executor::{self, Executor, ExecutorConfig};
use crate::core::history::HistoryLedger;
use crate::core::planner;
use crate::core::progress::ProgressBus;
use crate::models::plan::{BatchReport, PlanMode};
use crate::models::progress::Stage;
use crate::Result;
use chrono::Utc;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Executor for a plan mode; pointer output goes to the target mount when set.
pub(crate) fn executor_for(ctx: &Context, mode: PlanMode, bus: ProgressBus) -> Executor {
    let executor = Executor::new(Arc::clone(&ctx.source))
        .with_config(ExecutorConfig::from(&ctx.config))
        .with_progress(bus);
    match (&ctx.target, mode) {
        (Some(target), PlanMode::Pointer) => executor.with_target(Arc::clone(target)),
        _ => executor,
    }
}

/// Cancel the token on Ctrl-C. The running operation still finishes.
pub(crate) fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current operation");
            child.cancel();
        }
    });
    token
}

/// Apply a plan file.
pub async fn apply(ctx: &Context, plan_file: &Path, output: Option<&Path>) -> Result<()> {
    println!("{}", "[EXEC] Applying plan...".bold().cyan());
    println!();

    println!("[INFO] Loading plan: {}", plan_file.display());
    if !plan_file.exists() {
        return Err(crate::Error::PathNotFound(plan_file.display().to_string()));
    }
    let plan = planner::load_plan(plan_file)?;

    println!("  {} {}", "Mode:".bold(), plan.mode);
    println!("  {} {}", "Target:".bold(), plan.target_root);
    println!("  {} {}", "Operations:".bold(), plan.operations.len());
    println!();

    if plan.mode == PlanMode::Organize {
        println!("{}", "[WARNING] This will move and copy files!".bold().yellow());
        println!();
    }

    let mut ledger = HistoryLedger::open(&ctx.config.history_path)?;
    let cancel = cancel_on_interrupt();
    let bus = ProgressBus::default();
    let bar = progress::attach(&bus, Stage::Execute);

    let result = {
        let executor = executor_for(ctx, plan.mode, bus.clone());
        executor.apply(&plan, &mut ledger, Some(&cancel)).await
    };
    drop(bus);
    let _ = bar.await;
    ledger.save()?;
    let report = result?;

    let report_path = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let filename = format!("report_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
            plan_file
                .parent()
                .map(|p| p.join(&filename))
                .unwrap_or_else(|| PathBuf::from(&filename))
        }
    };
    executor::save_report(&report, &report_path)?;
    executor::print_summary(&report);
    println!(
        "{} {}",
        "[OK] Report saved to:".bold().green(),
        report_path.display()
    );

    print_next_steps(&report, &report_path);
    Ok(())
}

pub(crate) fn print_next_steps(report: &BatchReport, report_path: &Path) {
    println!();
    println!("{}", "[Next Steps]".bold().yellow());
    if !report.is_complete() {
        println!(
            "  To retry failed operations: {}",
            format!("strm-organizer retry {}", report_path.display()).cyan()
        );
    }
    println!(
        "  To undo changes: {}",
        format!("strm-organizer history rollback --batch {}", report.batch_id).cyan()
    );
}
