//! Classify command implementation.

use crate::cli::{progress, read_json, write_json, Context};
use crate::core::classifier;
use crate::core::progress::ProgressBus;
use crate::models::classify::{ClassificationContent, ClassifyOutcome};
use crate::models::media::ScanReport;
use crate::models::progress::Stage;
use crate::services::metadata::{MetadataProvider, StaticMetadata};
use crate::services::tmdb::{TmdbClient, TmdbConfig};
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Classify a scan report with a rules file.
pub async fn classify(
    ctx: &Context,
    scan_file: &Path,
    rules_file: &Path,
    metadata: Option<&Path>,
    output: &Path,
) -> Result<()> {
    println!("{}", "[CLASSIFY] Classifying scanned files...".bold().cyan());
    println!();

    let report: ScanReport = read_json(scan_file)?;
    let rules = classifier::load_rules(rules_file)?;
    println!("  {} {}", "Videos:".bold(), report.video_count());
    println!("  {} {}", "Items:".bold(), rules.items.len());
    println!();

    let provider: Box<dyn MetadataProvider> = match metadata {
        Some(path) => {
            println!("[INFO] Using offline metadata: {}", path.display());
            Box::new(StaticMetadata::load(path)?)
        }
        None => Box::new(TmdbClient::new(TmdbConfig::from_settings(&ctx.config.tmdb)?)),
    };

    let bus = ProgressBus::default();
    let bar = progress::attach(&bus, Stage::Classify);
    let outcome =
        classifier::classify_with_provider(&report.files, &rules.items, provider.as_ref(), &bus)
            .await;
    drop(bus);
    let _ = bar.await;

    print_outcome(&outcome);

    write_json(&outcome, output)?;
    println!(
        "{} {}",
        "[OK] Classification saved to:".bold().green(),
        output.display()
    );

    println!();
    println!("{}", "[Next Steps]".bold().yellow());
    println!(
        "  {}",
        format!("strm-organizer plan {}", output.display()).cyan()
    );

    Ok(())
}

fn print_outcome(outcome: &ClassifyOutcome) {
    println!();
    println!("{}", "[Classification Summary]".bold().green());
    for classification in &outcome.classifications {
        println!(
            "  {} {} ({}) - {} files",
            format!("[{}]", classification.id).cyan(),
            classification.name.bold(),
            classification.media_type(),
            classification.file_count()
        );
        if let ClassificationContent::Tv { seasons } = &classification.content {
            for (season, files) in seasons {
                println!("      Season {:02}: {} episodes", season, files.len());
            }
        }
    }

    if !outcome.unclassified.is_empty() {
        println!();
        println!(
            "{}",
            format!("Unclassified ({}):", outcome.unclassified.len())
                .bold()
                .yellow()
        );
        for path in &outcome.unclassified {
            println!("  - {}", path);
        }
    }

    if !outcome.needs_review.is_empty() {
        println!();
        println!(
            "{}",
            format!("Needs review ({}):", outcome.needs_review.len())
                .bold()
                .yellow()
        );
        for gap in &outcome.needs_review {
            println!("  - {} ({})", gap.path, gap.reason.to_string().dimmed());
        }
    }
    println!();
}
