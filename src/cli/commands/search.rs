//! Search command implementation.
//!
//! Looks titles up on the metadata service so their ids can go into a rules
//! file.

use crate::cli::Context;
use crate::models::media::{Candidate, MediaType};
use crate::services::metadata::MetadataProvider;
use crate::services::tmdb::{TmdbClient, TmdbConfig};
use crate::Result;
use colored::Colorize;

/// Execute search command.
pub async fn search(ctx: &Context, query: &str, media_type: MediaType, format: &str) -> Result<()> {
    let client = TmdbClient::new(TmdbConfig::from_settings(&ctx.config.tmdb)?);
    let candidates = client.search(query, media_type).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&candidates)?),
        "simple" => print_simple(&candidates),
        _ => print_table(&candidates, media_type),
    }
    Ok(())
}

/// Print results in simple format.
fn print_simple(candidates: &[Candidate]) {
    if candidates.is_empty() {
        println!("No results found.");
        return;
    }
    for candidate in candidates {
        println!(
            "{} {} ({})",
            candidate.id,
            candidate.name,
            candidate.year.map(|y| y.to_string()).unwrap_or_default()
        );
    }
}

/// Print results as table.
fn print_table(candidates: &[Candidate], media_type: MediaType) {
    if candidates.is_empty() {
        println!("{}", "No results found.".yellow());
        return;
    }

    println!(
        "{}",
        format!("Found {} {} results:", candidates.len(), media_type)
            .bold()
            .cyan()
    );
    println!();
    println!(" {:>10} | {:>4} | {}", "ID", "Year", "Title");
    println!("{}", "-".repeat(60));
    for candidate in candidates {
        let title = if candidate.name.chars().count() > 40 {
            format!("{}...", candidate.name.chars().take(37).collect::<String>())
        } else {
            candidate.name.clone()
        };
        println!(
            " {:>10} | {:>4} | {}",
            candidate.id,
            candidate.year.map(|y| y.to_string()).unwrap_or_default(),
            title
        );
    }
    println!();
}
