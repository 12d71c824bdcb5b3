//! Storage backed by a local directory.
//!
//! Used for remote services mounted into the file system (rclone, davfs,
//! SMB) and for tests. Storage paths are resolved below `root`.

use crate::services::storage::{Entry, Storage};
use crate::utils::{fs, path as spath};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Local directory storage.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    verify_copies: bool,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            verify_copies: true,
        }
    }

    /// Toggle SHA-256 verification of copies.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_copies = verify;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a storage path.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let normalized = spath::normalize(path);
        if normalized.split('/').any(|segment| segment == "..") {
            return Err(Error::Storage(format!("path escapes root: {}", path)));
        }
        Ok(self.root.join(normalized.trim_start_matches('/')))
    }

    async fn require(file: &Path, path: &str) -> Result<()> {
        if !tokio::fs::try_exists(file).await.unwrap_or(false) {
            return Err(Error::PathNotFound(path.to_string()));
        }
        Ok(())
    }

    async fn ensure_vacant(target: &Path) -> Result<()> {
        if tokio::fs::try_exists(target).await.unwrap_or(false) {
            return Err(Error::FileAlreadyExists(target.display().to_string()));
        }
        Ok(())
    }
}

/// Run blocking file work off the async runtime.
async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::Storage(format!("file task failed: {}", e)))?
}

#[async_trait]
impl Storage for LocalStorage {
    fn name(&self) -> &str {
        "local"
    }

    async fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = self.resolve(path)?;
        let metadata = tokio::fs::metadata(&dir)
            .await
            .map_err(|_| Error::PathNotFound(dir.display().to_string()))?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(dir.display().to_string()));
        }

        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if metadata.is_dir() {
                entries.push(Entry::dir(name));
            } else {
                entries.push(Entry::file(name, metadata.len()));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn reference(&self, path: &str) -> Result<String> {
        let file = self.resolve(path)?;
        Self::require(&file, path).await?;
        let absolute = tokio::fs::canonicalize(&file).await?;
        let encoded: Vec<String> = absolute
            .to_string_lossy()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        Ok(format!("file://{}", encoded.join("/")))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.resolve(path)?;
        Self::require(&file, path).await?;
        Ok(tokio::fs::read(file).await?)
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Err(e) = tokio::fs::write(&file, content).await {
            let _ = tokio::fs::remove_file(&file).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        Self::require(&source, from).await?;
        Self::ensure_vacant(&target).await?;
        blocking(move || {
            fs::ensure_parent(&target)?;
            fs::move_file(&source, &target)
        })
        .await
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        Self::require(&source, from).await?;
        Self::ensure_vacant(&target).await?;
        let verify = self.verify_copies;
        blocking(move || {
            fs::ensure_parent(&target)?;
            if verify {
                fs::verified_copy(&source, &target)
            } else {
                fs::copy_file(&source, &target)
            }
        })
        .await
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let file = self.resolve(path)?;
        Self::require(&file, path).await?;
        tokio::fs::remove_file(file).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.resolve(path)?).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_sorted_with_sizes() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("b_dir")).unwrap();
        std::fs::write(dir.path().join("a.mkv"), b"12345").unwrap();

        let storage = LocalStorage::new(dir.path());
        let entries = storage.list("/").await.unwrap();

        assert_eq!(entries, vec![Entry::file("a.mkv", 5), Entry::dir("b_dir")]);
    }

    #[tokio::test]
    async fn test_rename_refuses_existing_target() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mkv"), b"a").unwrap();
        std::fs::write(dir.path().join("b.mkv"), b"b").unwrap();

        let storage = LocalStorage::new(dir.path());
        let result = storage.rename("/a.mkv", "/b.mkv").await;

        assert!(matches!(result, Err(Error::FileAlreadyExists(_))));
        assert!(dir.path().join("a.mkv").exists());
    }

    #[tokio::test]
    async fn test_copy_creates_parents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.srt"), b"subs").unwrap();

        let storage = LocalStorage::new(dir.path());
        storage.copy("/a.srt", "/lib/Show/a.srt").await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("lib/Show/a.srt")).unwrap(), b"subs");
        assert!(dir.path().join("a.srt").exists());
    }

    #[tokio::test]
    async fn test_copy_without_verification() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mkv"), b"video").unwrap();

        let storage = LocalStorage::new(dir.path()).with_verification(false);
        storage.copy("/a.mkv", "/lib/a.mkv").await.unwrap();

        assert!(storage.exists("/lib/a.mkv").await.unwrap());
        assert!(matches!(
            storage.copy("/a.mkv", "/lib/a.mkv").await,
            Err(Error::FileAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_parent_segments_rejected() {
        let storage = LocalStorage::new("/tmp/x");
        assert!(storage.resolve("/a/../../etc").is_err());
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(matches!(
            storage.list("/nope").await,
            Err(Error::PathNotFound(_))
        ));
    }
}
