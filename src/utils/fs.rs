//! File system utilities for locally mounted storage.
//!
//! These are blocking; async callers run them on the blocking pool.

use crate::Result;
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::Path;

/// Create the parent directory of a file path.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Remove a leftover file, logging instead of failing.
pub fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("Could not remove leftover {}: {}", path.display(), e);
        }
    }
}

/// Copy a file. A failed copy leaves no partial destination behind.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    copy_or_discard(from, to, |from, to| std::fs::copy(from, to).map(|_| ()))
}

fn copy_or_discard<F>(from: &Path, to: &Path, copy: F) -> Result<()>
where
    F: FnOnce(&Path, &Path) -> io::Result<()>,
{
    if let Err(e) = copy(from, to) {
        discard(to);
        return Err(e.into());
    }
    Ok(())
}

/// Copy a file and compare SHA-256 digests. A mismatching copy is removed.
pub fn verified_copy(from: &Path, to: &Path) -> Result<()> {
    copy_file(from, to)?;
    let expected = sha256_file(from)?;
    let actual = sha256_file(to)?;
    if expected != actual {
        discard(to);
        return Err(crate::Error::ChecksumMismatch(to.display().to_string()));
    }
    Ok(())
}

/// Move a file from one location to another.
///
/// Either the move completes or `from` stays in place with no copy at `to`.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    // Try rename first (fast, same filesystem)
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // Fall back to copy + delete (cross filesystem)
    move_by_copy(from, to, |path| std::fs::remove_file(path))
}

fn move_by_copy<F>(from: &Path, to: &Path, remove_source: F) -> Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    copy_file(from, to)?;
    if let Err(e) = remove_source(from) {
        tracing::warn!(
            "Could not remove {} after copying, undoing the copy: {}",
            from.display(),
            e
        );
        discard(to);
        return Err(e.into());
    }
    Ok(())
}

/// SHA-256 of a file, hex encoded.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex(&hasher.finalize()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
