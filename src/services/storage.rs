//! Storage capability.
//!
//! The pipeline only talks to storage through this trait; backends decide how
//! a path maps onto a protocol. Paths are normalized `/`-separated strings
//! (see [`crate::utils::path`]).

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            is_dir: true,
        }
    }
}

/// Remote storage operations used by the scanner and executor.
///
/// Write operations create missing parent directories.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// List the direct children of a directory.
    async fn list(&self, path: &str) -> Result<Vec<Entry>>;

    /// Network locator a player can use to open the file.
    async fn reference(&self, path: &str) -> Result<String>;

    /// Read a whole file.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Create or replace a file.
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;

    /// Move a file. Fails if the destination exists.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Copy a file. Fails if the destination exists.
    async fn copy(&self, from: &str, to: &str) -> Result<()>;

    /// Delete a file.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Whether a file or directory exists.
    async fn exists(&self, path: &str) -> Result<bool>;
}
