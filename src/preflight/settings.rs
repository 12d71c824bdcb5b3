//! Configuration check.

use super::CheckResult;
use crate::models::config::Config;
use crate::models::plan::PlanMode;
use crate::{Error, Result};

/// Reject configurations that cannot run `mode` safely.
pub fn validate(config: &Config, mode: PlanMode) -> Result<()> {
    if config.target_root(mode).is_none() {
        return Err(Error::config(format!(
            "no target root for {} mode (set targets.{})",
            mode, mode
        )));
    }

    if mode == PlanMode::Pointer {
        if let Some(base) = config.pointer.base_url.as_deref() {
            let base = base.trim();
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(Error::config(format!(
                    "pointer.base_url must be an http(s) URL, got '{}'",
                    base
                )));
            }
        }
    }

    if !config.upload_delay.is_finite() || config.upload_delay < 0.0 {
        return Err(Error::config("upload_delay must be a non-negative number"));
    }
    if !config.scan.delay.is_finite() || config.scan.delay < 0.0 {
        return Err(Error::config("scan.delay must be a non-negative number"));
    }
    Ok(())
}

pub fn check(config: &Config, mode: PlanMode) -> CheckResult {
    match validate(config, mode) {
        Ok(()) => CheckResult::ok("Configuration", &format!("{} mode ready", mode)),
        Err(e) => CheckResult::fail(
            "Configuration",
            &e.to_string(),
            "Edit the config file or pass --config",
        ),
    }
}
