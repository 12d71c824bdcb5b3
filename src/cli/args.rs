//! Command line argument definitions.

use crate::models::media::MediaType;
use crate::models::plan::PlanMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Strm Organizer - Turn a remote media tree into a library or .strm pointers
#[derive(Parser, Debug)]
#[command(name = "strm-organizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    /// Configuration file (default: <config dir>/strm_organizer/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Local mount of the source storage
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub source_root: PathBuf,

    /// Local mount of a separate output storage for pointer files
    #[arg(long, global = true, value_name = "DIR")]
    pub target_mount: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a storage directory for videos and subtitles
    Scan {
        /// Storage path to scan
        #[arg(value_name = "PATH", default_value = "/")]
        path: String,

        /// Output path for the scan report
        #[arg(short, long, value_name = "OUTPUT", default_value = "scan.json")]
        output: PathBuf,
    },

    /// Classify a scan with a rules file
    Classify {
        /// Scan report produced by `scan`
        #[arg(value_name = "SCAN_FILE")]
        scan_file: PathBuf,

        /// Rules file (TOML or JSON)
        #[arg(short, long, value_name = "RULES")]
        rules: PathBuf,

        /// Offline metadata file instead of TMDB
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,

        /// Output path for the classification
        #[arg(short, long, value_name = "OUTPUT", default_value = "classification.json")]
        output: PathBuf,
    },

    /// Generate an operation plan from a classification
    Plan {
        /// Classification produced by `classify`
        #[arg(value_name = "CLASSIFICATION_FILE")]
        classification_file: PathBuf,

        /// Output mode
        #[arg(short, long, value_enum, default_value = "organize")]
        mode: ModeArg,

        /// Output path for the plan
        #[arg(short, long, value_name = "OUTPUT", default_value = "plan.json")]
        output: PathBuf,

        /// Print the operations without writing the plan
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply a plan file
    Apply {
        /// Path to the plan.json file
        #[arg(value_name = "PLAN_FILE")]
        plan_file: PathBuf,

        /// Output path for the batch report
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Retry the failed operations of a batch
    Retry {
        /// Batch report written by `apply`
        #[arg(value_name = "REPORT_FILE")]
        report_file: PathBuf,
    },

    /// Inspect or roll back applied operations
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Search the metadata service for an item id
    Search {
        /// Title to search for
        #[arg(value_name = "QUERY")]
        query: String,

        /// Media type
        #[arg(short = 't', long = "type", value_enum, default_value = "tv")]
        media_type: MediaTypeArg,

        /// Output format: table, simple, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export the pointers of a plan as a zip bundle
    Export {
        /// Pointer plan produced by `plan --mode pointer`
        #[arg(value_name = "PLAN_FILE")]
        plan_file: PathBuf,

        /// Output file path (default: auto-generated with timestamp)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List records, most recent first
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Records per page
        #[arg(long, default_value_t = 20)]
        per_page: usize,
    },

    /// Roll back a record or a whole batch
    Rollback {
        /// Record id
        #[arg(value_name = "ID", required_unless_present = "batch")]
        id: Option<u64>,

        /// Roll back every successful record of a batch
        #[arg(long, value_name = "BATCH_ID", conflicts_with = "id")]
        batch: Option<String>,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    Organize,
    Pointer,
}

impl From<ModeArg> for PlanMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Organize => PlanMode::Organize,
            ModeArg::Pointer => PlanMode::Pointer,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum MediaTypeArg {
    Tv,
    Movie,
}

impl From<MediaTypeArg> for MediaType {
    fn from(media_type: MediaTypeArg) -> Self {
        match media_type {
            MediaTypeArg::Tv => MediaType::Tv,
            MediaTypeArg::Movie => MediaType::Movie,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from([
            "strm-organizer",
            "--source-root",
            "/mnt/drive",
            "plan",
            "classification.json",
            "--mode",
            "pointer",
        ])
        .unwrap();
        assert_eq!(cli.source_root, PathBuf::from("/mnt/drive"));
        match cli.command {
            Commands::Plan { mode, dry_run, .. } => {
                assert_eq!(PlanMode::from(mode), PlanMode::Pointer);
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rollback_needs_id_or_batch() {
        assert!(Cli::try_parse_from(["strm-organizer", "history", "rollback"]).is_err());
        assert!(Cli::try_parse_from(["strm-organizer", "history", "rollback", "3"]).is_ok());
        assert!(
            Cli::try_parse_from(["strm-organizer", "history", "rollback", "--batch", "b1"]).is_ok()
        );
    }
}
