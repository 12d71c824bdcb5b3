//! History command implementation.

use crate::cli::commands::apply::executor_for;
use crate::cli::Context;
use crate::core::history::{reversal_of, HistoryLedger, Reversal};
use crate::core::progress::ProgressBus;
use crate::models::history::{HistoryRecord, HistoryStatus};
use crate::models::plan::PlanMode;
use crate::{Error, Result};
use colored::Colorize;

/// List history records, most recent first. `page` starts at 1.
pub fn list(ctx: &Context, page: usize, per_page: usize) -> Result<()> {
    let ledger = HistoryLedger::open(&ctx.config.history_path)?;
    if ledger.is_empty() {
        println!("{}", "No history records.".yellow());
        return Ok(());
    }

    let result = ledger.page(page.saturating_sub(1), per_page);
    let pages = result.total.div_ceil(result.per_page);
    println!(
        "{}",
        format!("History (page {} of {}, {} records):", page, pages, result.total)
            .bold()
            .cyan()
    );
    println!(
        " {:>5} | {:<8} | {:<14} | {:<30} | {}",
        "#", "Status", "Kind", "Title", "Path"
    );
    println!("{}", "-".repeat(100));

    for record in &result.records {
        let title = if record.title.chars().count() > 28 {
            format!("{}...", record.title.chars().take(25).collect::<String>())
        } else {
            record.title.clone()
        };
        println!(
            " {:>5} | {:<8} | {:<14} | {:<30} | {} -> {}",
            record.id,
            status_label(record.status),
            record.kind.to_string(),
            title,
            record.original_path,
            record.new_path
        );
        if let Some(error) = &record.error_message {
            println!("         {}", error.red());
        }
    }

    if result.has_more() {
        println!();
        println!(
            "  Next page: {}",
            format!("strm-organizer history list --page {}", page + 1).cyan()
        );
    }
    Ok(())
}

fn status_label(status: HistoryStatus) -> String {
    let label = format!("{:<8}", status.to_string());
    match status {
        HistoryStatus::Success => label.green().to_string(),
        HistoryStatus::Failed => label.red().to_string(),
        HistoryStatus::Rollback => label.yellow().to_string(),
    }
}

fn describe(record: &HistoryRecord) -> String {
    match reversal_of(record) {
        Ok(Reversal::MoveBack { from, to }) => format!("move {} -> {}", from, to),
        Ok(Reversal::Remove(path)) => format!("remove {}", path),
        Err(e) => e.to_string(),
    }
}

/// Roll back one record or every successful record of a batch.
pub async fn rollback(
    ctx: &Context,
    id: Option<u64>,
    batch: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    println!("{}", "[ROLLBACK] Rollback command".bold().cyan());
    println!();

    let mut ledger = HistoryLedger::open(&ctx.config.history_path)?;
    let records: Vec<HistoryRecord> = match (id, batch) {
        (Some(id), _) => vec![ledger
            .get(id)
            .cloned()
            .ok_or(Error::HistoryRecordNotFound(id))?],
        (None, Some(batch)) => ledger
            .batch(batch)
            .into_iter()
            .filter(|r| r.status == HistoryStatus::Success)
            .rev()
            .cloned()
            .collect(),
        (None, None) => return Err(Error::other("give a record id or --batch")),
    };

    if records.is_empty() {
        println!("{}", "Nothing to roll back.".yellow());
        return Ok(());
    }

    if dry_run {
        println!("{}", "[DRY-RUN] Showing what would be done:".bold().yellow());
        for record in &records {
            println!("  #{} [{}] {}", record.id, record.mode, describe(record));
        }
        println!();
        println!("{}", "[OK] Dry run complete - no changes were made".green());
        return Ok(());
    }

    println!(
        "{}",
        "[WARNING] This will reverse the selected operations!"
            .bold()
            .yellow()
    );
    println!();

    // Each record's mode picks source or target mount inside the executor.
    let executor = executor_for(ctx, PlanMode::Pointer, ProgressBus::default());
    let (done, failed) = match (id, batch) {
        (Some(id), _) => match executor.rollback(id, &mut ledger).await {
            Ok(_) => (vec![id], Vec::new()),
            Err(e) => (Vec::new(), vec![(id, e)]),
        },
        (None, Some(batch)) => executor.rollback_batch(batch, &mut ledger).await,
        (None, None) => (Vec::new(), Vec::new()),
    };
    ledger.save()?;

    println!("{}", "[Rollback Summary]".bold().green());
    println!("  {} {}", "Rolled back:".bold(), done.len());
    println!("  {} {}", "Failed:".bold(), failed.len());
    for (id, error) in &failed {
        println!("    - #{} {}", id, error.to_string().red());
    }
    println!();

    if failed.is_empty() {
        println!("{}", "[OK] Rollback completed successfully!".green());
    } else {
        println!(
            "{}",
            "[WARNING] Some operations could not be reversed".yellow()
        );
    }
    Ok(())
}
