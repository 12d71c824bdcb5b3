//! In-process storage.
//!
//! Keeps files in a map, records every mutating call, and can be told to fail
//! on chosen paths. Used for dry runs and tests.

use crate::services::storage::{Entry, Storage};
use crate::utils::path as spath;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    failing: BTreeSet<String>,
    log: Vec<String>,
}

impl State {
    fn check(&self, paths: &[&str]) -> Result<()> {
        for path in paths {
            if self.failing.contains(*path) {
                return Err(Error::Storage(format!("injected failure: {}", path)));
            }
        }
        Ok(())
    }

    fn is_dir(&self, path: &str) -> bool {
        if path == "/" || self.dirs.contains(path) {
            return true;
        }
        let prefix = format!("{}/", path);
        self.files.keys().any(|f| f.starts_with(&prefix))
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given size (content is zero bytes of that length).
    pub fn add_file(&self, path: &str, size: usize) {
        self.insert(path, vec![0u8; size]);
    }

    /// Add a file with explicit content.
    pub fn insert(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.state()
            .files
            .insert(spath::normalize(path), content.into());
    }

    /// Add an empty directory.
    pub fn add_dir(&self, path: &str) {
        self.state().dirs.insert(spath::normalize(path));
    }

    /// Make every call touching `path` fail.
    pub fn fail_on(&self, path: &str) {
        self.state().failing.insert(spath::normalize(path));
    }

    /// Undo [`MemoryStorage::fail_on`].
    pub fn heal(&self, path: &str) {
        self.state().failing.remove(&spath::normalize(path));
    }

    /// Content of a file, if present.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(&spath::normalize(path)).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state().files.contains_key(&spath::normalize(path))
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    /// Mutating calls in order, e.g. `rename /a -> /b`.
    pub fn operations(&self) -> Vec<String> {
        self.state().log.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = spath::normalize(path);
        let state = self.state();
        state.check(&[&dir])?;
        if !state.is_dir(&dir) {
            return Err(Error::PathNotFound(dir));
        }

        let mut children: BTreeMap<String, Entry> = BTreeMap::new();
        let candidates = state
            .files
            .iter()
            .map(|(p, c)| (p.as_str(), Some(c.len() as u64)))
            .chain(state.dirs.iter().map(|d| (d.as_str(), None)));
        for (candidate, size) in candidates {
            let Some(rest) = spath::strip_root(candidate, &dir) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.split_once('/') {
                Some((child, _)) => {
                    children
                        .entry(child.to_string())
                        .or_insert_with(|| Entry::dir(child));
                }
                None => {
                    let entry = match size {
                        Some(size) => Entry::file(rest, size),
                        None => Entry::dir(rest),
                    };
                    children.insert(rest.to_string(), entry);
                }
            }
        }
        Ok(children.into_values().collect())
    }

    async fn reference(&self, path: &str) -> Result<String> {
        let path = spath::normalize(path);
        let state = self.state();
        state.check(&[&path])?;
        if !state.files.contains_key(&path) {
            return Err(Error::PathNotFound(path));
        }
        Ok(format!("memory://{}", path))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = spath::normalize(path);
        let state = self.state();
        state.check(&[&path])?;
        state
            .files
            .get(&path)
            .cloned()
            .ok_or(Error::PathNotFound(path))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let path = spath::normalize(path);
        let mut state = self.state();
        state.check(&[&path])?;
        state.log.push(format!("write {}", path));
        state.files.insert(path, content.to_vec());
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let (from, to) = (spath::normalize(from), spath::normalize(to));
        let mut state = self.state();
        state.check(&[&from, &to])?;
        if state.files.contains_key(&to) {
            return Err(Error::FileAlreadyExists(to));
        }
        let content = state
            .files
            .remove(&from)
            .ok_or_else(|| Error::PathNotFound(from.clone()))?;
        state.log.push(format!("rename {} -> {}", from, to));
        state.files.insert(to, content);
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        let (from, to) = (spath::normalize(from), spath::normalize(to));
        let mut state = self.state();
        state.check(&[&from, &to])?;
        if state.files.contains_key(&to) {
            return Err(Error::FileAlreadyExists(to));
        }
        let content = state
            .files
            .get(&from)
            .cloned()
            .ok_or_else(|| Error::PathNotFound(from.clone()))?;
        state.log.push(format!("copy {} -> {}", from, to));
        state.files.insert(to, content);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let path = spath::normalize(path);
        let mut state = self.state();
        state.check(&[&path])?;
        if state.files.remove(&path).is_none() {
            return Err(Error::PathNotFound(path));
        }
        state.log.push(format!("remove {}", path));
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let path = spath::normalize(path);
        let state = self.state();
        Ok(state.files.contains_key(&path) || state.is_dir(&path))
    }
}
