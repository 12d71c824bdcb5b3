//! Preflight checks module.
//!
//! Runs before any stage that reaches storage or the metadata service. A
//! failed check stops the command before anything destructive happens.

pub mod settings;
mod storage;
mod tmdb;

use crate::models::config::Config;
use crate::models::plan::PlanMode;
use crate::services::storage::Storage;
use crate::{Error, Result};
use colored::Colorize;

/// Result of a preflight check.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub success: bool,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    pub fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn fail(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }
}

/// What a command needs checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checks {
    /// Plan mode whose configuration must be complete.
    pub mode: Option<PlanMode>,
    /// Whether the metadata service is used.
    pub tmdb: bool,
}

/// Run the requested preflight checks.
pub async fn run_preflight_checks(
    config: &Config,
    storage: &dyn Storage,
    source_root: &str,
    checks: Checks,
) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if let Some(mode) = checks.mode {
        results.push(settings::check(config, mode));
    }

    results.push(storage::check(storage, source_root).await);

    if checks.tmdb {
        results.push(tmdb::check(&config.tmdb).await);
    }

    results
}

/// Print preflight check results.
pub fn print_results(results: &[CheckResult]) {
    for result in results {
        if result.success {
            println!(
                "{} {}: {}",
                "[OK]".green(),
                result.name.bold(),
                result.message
            );
        } else {
            println!(
                "{} {}: {}",
                "[FAIL]".red(),
                result.name.bold(),
                result.message
            );
            if let Some(ref hint) = result.hint {
                println!("  {} {}", "->".yellow(), hint);
            }
        }
    }
}

/// Check if all preflight checks passed.
pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.success)
}

/// Turn failed checks into an error.
pub fn require_all(results: &[CheckResult]) -> Result<()> {
    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.name.as_str())
        .collect();
    if failed.is_empty() {
        return Ok(());
    }
    Err(Error::config(format!(
        "preflight checks failed: {}",
        failed.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStorage;

    #[tokio::test]
    async fn test_missing_source_root_fails() {
        let storage = MemoryStorage::new();
        storage.add_file("/media/a.mkv", 1);

        let results = run_preflight_checks(
            &Config::default(),
            &storage,
            "/missing",
            Checks::default(),
        )
        .await;
        assert!(!all_passed(&results));
        assert!(require_all(&results).unwrap_err().is_fatal_config());

        let results =
            run_preflight_checks(&Config::default(), &storage, "/media", Checks::default()).await;
        assert!(all_passed(&results));
    }

    #[tokio::test]
    async fn test_mode_checks_configuration() {
        let storage = MemoryStorage::new();
        storage.add_dir("/media");
        let checks = Checks {
            mode: Some(PlanMode::Organize),
            tmdb: false,
        };
        let results = run_preflight_checks(&Config::default(), &storage, "/media", checks).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
    }
}
