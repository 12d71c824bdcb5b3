//! Command line interface.

pub mod args;
pub mod commands;
pub mod progress;

use crate::models::config::{self, Config};
use crate::services::local::LocalStorage;
use crate::services::storage::Storage;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings and storages shared by every command.
pub struct Context {
    pub config: Config,
    /// Storage holding the unorganized media.
    pub source: Arc<dyn Storage>,
    /// Separate storage for pointer output, when configured.
    pub target: Option<Arc<dyn Storage>>,
    pub skip_preflight: bool,
}

impl Context {
    /// Load the configuration and open the local mounts.
    pub fn load(
        config_path: Option<&Path>,
        source_root: &Path,
        target_root: Option<&Path>,
        skip_preflight: bool,
    ) -> Result<Self> {
        let config = match config_path {
            Some(path) => config::load_config_from(path)?,
            None => config::load_config(),
        };

        if !source_root.exists() {
            return Err(crate::Error::PathNotFound(source_root.display().to_string()));
        }
        if !source_root.is_dir() {
            return Err(crate::Error::NotADirectory(
                source_root.display().to_string(),
            ));
        }

        let verify = config.verify_copies;
        let source: Arc<dyn Storage> =
            Arc::new(LocalStorage::new(source_root).with_verification(verify));
        let target = target_root.map(|root| {
            Arc::new(LocalStorage::new(PathBuf::from(root)).with_verification(verify))
                as Arc<dyn Storage>
        });

        tracing::debug!(
            "Source storage at {}, target {:?}",
            source_root.display(),
            target_root
        );

        Ok(Self {
            config,
            source,
            target,
            skip_preflight,
        })
    }

    /// Storage that pointer and organize output is written to.
    pub fn output_storage(&self) -> Arc<dyn Storage> {
        self.target.clone().unwrap_or_else(|| Arc::clone(&self.source))
    }
}

/// Read a JSON artifact written by an earlier stage.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(crate::Error::PathNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write a stage artifact as pretty JSON.
pub fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
