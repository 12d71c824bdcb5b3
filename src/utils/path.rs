//! Helpers for storage paths.
//!
//! Storage paths are `/`-separated strings rooted at `/`, independent of the
//! host platform.

/// Normalize a storage path: leading `/`, no trailing `/`, no empty or `.`
/// segments, `\` treated as a separator.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

/// Join a directory and a relative path.
pub fn join(dir: &str, name: &str) -> String {
    normalize(&format!("{}/{}", dir, name))
}

/// Parent directory of a path (`/` for top-level entries).
pub fn parent(path: &str) -> String {
    let path = normalize(path);
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Last segment of a path.
pub fn file_name(path: &str) -> String {
    let path = normalize(path);
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Split a file name into stem and extension (without dot).
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Number of segments below the root.
pub fn depth(path: &str) -> usize {
    normalize(path).split('/').filter(|s| !s.is_empty()).count()
}

/// Path of `path` relative to `root`, if it lies below it.
pub fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return Some(path.trim_start_matches('/'));
    }
    path.strip_prefix(root)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .map(|rest| rest.trim_start_matches('/'))
}
