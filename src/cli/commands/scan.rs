//! Scan command implementation.

use crate::cli::{progress, write_json, Context};
use crate::core::progress::ProgressBus;
use crate::core::scanner::{Scanner, ScannerConfig};
use crate::models::progress::Stage;
use crate::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

/// Scan `path` on the source storage and write the report.
pub async fn scan(ctx: &Context, path: &str, output: &Path) -> Result<()> {
    println!("{}", "[SCAN] Scanning storage...".bold().cyan());
    println!("  {} {}", "Storage:".bold(), ctx.source.name());
    println!("  {} {}", "Path:".bold(), path);
    println!();

    let bus = ProgressBus::default();
    let bar = progress::attach(&bus, Stage::Scan);
    let report = {
        let scanner = Scanner::with_config(
            Arc::clone(&ctx.source),
            ScannerConfig::from(&ctx.config.scan),
        )
        .with_progress(bus.clone());
        scanner.scan(path).await?
    };
    drop(bus);
    let _ = bar.await;

    println!();
    println!("{}", "[Scan Summary]".bold().green());
    println!("  {} {}", "Directories:".bold(), report.directories);
    println!("  {} {}", "Videos:".bold(), report.video_count());
    println!("  {} {}", "Subtitles:".bold(), report.subtitle_count());
    if report.truncated {
        println!(
            "  {}",
            "File limit reached, the scan is incomplete".yellow()
        );
    }
    if !report.errors.is_empty() {
        println!("  {} {}", "Unreadable directories:".bold(), report.errors.len());
        for error in &report.errors {
            println!("    - {} ({})", error.directory, error.reason.dimmed());
        }
    }

    write_json(&report, output)?;
    println!();
    println!(
        "{} {}",
        "[OK] Scan report saved to:".bold().green(),
        output.display()
    );

    println!();
    println!("{}", "[Next Steps]".bold().yellow());
    println!(
        "  {}",
        format!(
            "strm-organizer classify {} --rules rules.toml",
            output.display()
        )
        .cyan()
    );

    Ok(())
}
