//! Plan command implementation.
//!
//! Turns a classification into a plan file. Pointer locators are resolved
//! here, before the pure planning step.

use crate::cli::{read_json, Context};
use crate::core::planner::{self, Locators, PlannerConfig};
use crate::models::classify::ClassifyOutcome;
use crate::models::plan::{OperationKind, Plan, PlanMode};
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Generate a plan from a classification file.
pub async fn plan(
    ctx: &Context,
    classification_file: &Path,
    mode: PlanMode,
    output: &Path,
    dry_run: bool,
) -> Result<()> {
    println!(
        "{}",
        format!("[PLAN] Planning {} operations...", mode).bold().cyan()
    );
    println!();

    let outcome: ClassifyOutcome = read_json(classification_file)?;
    let config = PlannerConfig::from_config(&ctx.config, mode)?;

    let locators = match mode {
        PlanMode::Pointer => {
            planner::resolve_locators(
                &outcome.classifications,
                &ctx.config.pointer,
                ctx.source.as_ref(),
            )
            .await
        }
        PlanMode::Organize => Locators::new(),
    };

    let plan = planner::plan(&outcome.classifications, &config, &locators);
    print_plan_summary(&plan);

    if dry_run {
        println!("{}", "[DRY-RUN] Planned operations:".bold().yellow());
        for op in &plan.operations {
            println!(
                "  {} {} -> {}",
                format!("{:<14}", op.kind.to_string()).cyan(),
                op.source,
                op.destination
            );
        }
        println!();
        println!("{}", "[OK] Dry run complete - no plan was written".green());
        return Ok(());
    }

    planner::save_plan(&plan, output)?;
    println!(
        "{} {}",
        "[OK] Plan saved to:".bold().green(),
        output.display()
    );

    println!();
    println!("{}", "[Next Steps]".bold().yellow());
    println!("  1. Review the plan: {}", output.display());
    println!(
        "  2. Apply: {}",
        format!("strm-organizer apply {}", output.display()).cyan()
    );
    if mode == PlanMode::Pointer {
        println!(
            "  or export: {}",
            format!("strm-organizer export {}", output.display()).cyan()
        );
    }

    Ok(())
}

fn print_plan_summary(plan: &Plan) {
    println!("{}", "[Plan Summary]".bold().green());
    println!("  {} {}", "Mode:".bold(), plan.mode);
    println!("  {} {}", "Target:".bold(), plan.target_root);
    println!("  {} {}", "Copies:".bold(), plan.count(OperationKind::Copy));
    println!("  {} {}", "Moves:".bold(), plan.count(OperationKind::Move));
    println!(
        "  {} {}",
        "Pointers:".bold(),
        plan.count(OperationKind::CreatePointer)
    );
    if !plan.conflicts.is_empty() {
        println!(
            "  {} {}",
            "Skipped:".bold().yellow(),
            plan.conflicts.len()
        );
        for conflict in &plan.conflicts {
            println!("    - {} ({})", conflict.source, conflict.reason.dimmed());
        }
    }
    println!();
}
