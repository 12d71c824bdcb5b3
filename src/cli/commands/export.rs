//! Export command implementation.

use crate::cli::Context;
use crate::core::exporter;
use crate::core::planner;
use crate::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Bundle the pointers of a plan into a zip file.
pub async fn export(ctx: &Context, plan_file: &Path, output: Option<&Path>) -> Result<()> {
    println!("{}", "[EXPORT] Exporting pointer bundle...".bold().cyan());
    println!();

    if !plan_file.exists() {
        return Err(crate::Error::PathNotFound(plan_file.display().to_string()));
    }
    let plan = planner::load_plan(plan_file)?;
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(exporter::auto_filename()));

    let manifest =
        exporter::export_pointer_bundle(&plan, ctx.source.as_ref(), &output_path).await?;

    println!("{}", "[Export Summary]".bold().green());
    println!("  {} {}", "Pointers:".bold(), manifest.pointers);
    println!("  {} {}", "Subtitles:".bold(), manifest.subtitles);
    println!("  {} {}", "Root:".bold(), manifest.target_root);
    println!();
    println!(
        "{} {}",
        "[OK] Bundle saved to:".bold().green(),
        output_path.display()
    );
    Ok(())
}
