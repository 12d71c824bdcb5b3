//! Retry command implementation.

use crate::cli::commands::apply::{cancel_on_interrupt, executor_for, print_next_steps};
use crate::cli::{progress, Context};
use crate::core::executor;
use crate::core::history::HistoryLedger;
use crate::core::progress::ProgressBus;
use crate::models::progress::Stage;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Retry the failed and cancelled operations of a batch report.
///
/// The report file is updated in place.
pub async fn retry(ctx: &Context, report_file: &Path) -> Result<()> {
    println!("{}", "[RETRY] Retrying failed operations...".bold().cyan());
    println!();

    if !report_file.exists() {
        return Err(crate::Error::PathNotFound(report_file.display().to_string()));
    }
    let report = executor::load_report(report_file)?;
    println!("  {} {}", "Batch:".bold(), report.batch_id);
    println!("  {} {}", "Succeeded:".bold(), report.succeeded());
    println!("  {} {}", "To retry:".bold(), report.retryable().len());
    println!();

    if report.is_complete() {
        println!("{}", "[OK] Nothing to retry".green());
        return Ok(());
    }

    let mut ledger = HistoryLedger::open(&ctx.config.history_path)?;
    let cancel = cancel_on_interrupt();
    let bus = ProgressBus::default();
    let bar = progress::attach(&bus, Stage::Execute);

    let result = {
        let executor = executor_for(ctx, report.mode, bus.clone());
        executor.retry(&report, &mut ledger, Some(&cancel)).await
    };
    drop(bus);
    let _ = bar.await;
    ledger.save()?;
    let updated = result?;

    executor::save_report(&updated, report_file)?;
    executor::print_summary(&updated);
    println!(
        "{} {}",
        "[OK] Report updated:".bold().green(),
        report_file.display()
    );

    print_next_steps(&updated, report_file);
    Ok(())
}
