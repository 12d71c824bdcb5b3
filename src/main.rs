//! Strm Organizer CLI
//!
//! A command-line tool that organizes a remote media tree into a library, or
//! mirrors it as `.strm` pointer files.

use clap::Parser;
use strm_organizer::cli::{
    args::{Cli, Commands, HistoryAction},
    commands::{apply, classify, export, history, plan, retry, scan, search},
    Context,
};
use strm_organizer::models::plan::PlanMode;
use strm_organizer::preflight::{self, Checks};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let ctx = Context::load(
        cli.config.as_deref(),
        &cli.source_root,
        cli.target_mount.as_deref(),
        cli.skip_preflight,
    )?;

    // Run the appropriate command
    match cli.command {
        Commands::Scan { path, output } => {
            run_preflight_checks(&ctx, &path, Checks::default()).await?;
            scan::scan(&ctx, &path, &output).await?;
        }

        Commands::Classify {
            scan_file,
            rules,
            metadata,
            output,
        } => {
            let checks = Checks {
                mode: None,
                tmdb: metadata.is_none(),
            };
            run_preflight_checks(&ctx, "/", checks).await?;
            classify::classify(&ctx, &scan_file, &rules, metadata.as_deref(), &output).await?;
        }

        Commands::Plan {
            classification_file,
            mode,
            output,
            dry_run,
        } => {
            let mode = PlanMode::from(mode);
            let checks = Checks {
                mode: Some(mode),
                tmdb: false,
            };
            run_preflight_checks(&ctx, "/", checks).await?;
            plan::plan(&ctx, &classification_file, mode, &output, dry_run).await?;
        }

        Commands::Apply { plan_file, output } => {
            let plan = strm_organizer::core::planner::load_plan(&plan_file)?;
            let checks = Checks {
                mode: Some(plan.mode),
                tmdb: false,
            };
            run_preflight_checks(&ctx, "/", checks).await?;
            apply::apply(&ctx, &plan_file, output.as_deref()).await?;
        }

        Commands::Retry { report_file } => {
            run_preflight_checks(&ctx, "/", Checks::default()).await?;
            retry::retry(&ctx, &report_file).await?;
        }

        Commands::History { action } => match action {
            HistoryAction::List { page, per_page } => {
                history::list(&ctx, page, per_page)?;
            }
            HistoryAction::Rollback { id, batch, dry_run } => {
                history::rollback(&ctx, id, batch.as_deref(), dry_run).await?;
            }
        },

        Commands::Search {
            query,
            media_type,
            format,
        } => {
            search::search(&ctx, &query, media_type.into(), &format).await?;
        }

        Commands::Export { plan_file, output } => {
            export::export(&ctx, &plan_file, output.as_deref()).await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("strm_organizer=debug")
    } else {
        EnvFilter::new("strm_organizer=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Run preflight checks and exit if any fail.
async fn run_preflight_checks(ctx: &Context, source_root: &str, checks: Checks) -> anyhow::Result<()> {
    use colored::Colorize;

    if ctx.skip_preflight {
        return Ok(());
    }

    println!("{}", "Running preflight checks...".bold());
    println!();

    let results =
        preflight::run_preflight_checks(&ctx.config, ctx.source.as_ref(), source_root, checks)
            .await;
    preflight::print_results(&results);

    println!();

    if !preflight::all_passed(&results) {
        anyhow::bail!("Preflight checks failed. Fix the issues above and try again.");
    }

    Ok(())
}
