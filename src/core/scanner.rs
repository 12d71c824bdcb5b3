//! Directory scanner module.
//!
//! Walks a storage tree directory by directory, waiting the configured delay
//! before each listing after the first. Unreadable directories are recorded
//! and skipped. Subtitles are paired to videos once the walk is done.

use crate::core::parser;
use crate::core::progress::ProgressBus;
use crate::models::config::ScanConfig;
use crate::models::media::{FileKind, ScanError, ScanReport, ScannedFile};
use crate::models::progress::Stage;
use crate::services::storage::Storage;
use crate::utils::path as spath;
use crate::Result;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Emit a progress snapshot every this many directories.
const PROGRESS_INTERVAL: usize = 5;

/// Aggregate scan counters, safe to read while a scan runs.
#[derive(Debug, Default)]
pub struct ScanCounters {
    directories: AtomicUsize,
    videos: AtomicUsize,
    subtitles: AtomicUsize,
}

/// Point-in-time copy of [`ScanCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSnapshot {
    pub directories: usize,
    pub videos: usize,
    pub subtitles: usize,
}

impl ScanCounters {
    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            directories: self.directories.load(Ordering::Relaxed),
            videos: self.videos.load(Ordering::Relaxed),
            subtitles: self.subtitles.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.directories.store(0, Ordering::Relaxed);
        self.videos.store(0, Ordering::Relaxed);
        self.subtitles.store(0, Ordering::Relaxed);
    }
}

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub recursive: bool,
    pub delay: Duration,
    pub max_depth: usize,
    pub max_files: usize,
    pub video_extensions: Vec<String>,
    pub subtitle_extensions: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScannerConfig {
    fn from(config: &ScanConfig) -> Self {
        Self {
            recursive: config.recursive,
            delay: config.delay(),
            max_depth: config.max_depth,
            max_files: config.max_files,
            video_extensions: config.video_extensions.clone(),
            subtitle_extensions: config.subtitle_extensions.clone(),
            exclude_patterns: config.exclude_patterns.clone(),
        }
    }
}

impl ScannerConfig {
    fn kind_of(&self, name: &str) -> Option<FileKind> {
        let ext = parser::extension(name)?;
        if self.video_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            Some(FileKind::Video)
        } else if self.subtitle_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            Some(FileKind::Subtitle)
        } else {
            None
        }
    }
}

/// Check if a filename indicates a sample file.
/// Matches filenames containing "sample" (case-insensitive).
fn is_sample_filename(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.contains("sample") && !lower.contains("sampler")
}

/// Build the scanned record for a file.
fn scanned_file(directory: &str, name: &str, size: u64, kind: FileKind) -> ScannedFile {
    let language = match kind {
        FileKind::Subtitle => parser::subtitle_language(name),
        FileKind::Video => None,
    };
    ScannedFile {
        path: spath::join(directory, name),
        name: name.to_string(),
        kind,
        size,
        directory: directory.to_string(),
        raw_episode: parser::extract_episode(name),
        language,
        video_ref: None,
    }
}

/// Storage scanner.
pub struct Scanner {
    storage: Arc<dyn Storage>,
    config: ScannerConfig,
    progress: ProgressBus,
    counters: Arc<ScanCounters>,
}

impl Scanner {
    /// Create a scanner with default configuration.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_config(storage, ScannerConfig::default())
    }

    /// Create a scanner with custom configuration.
    pub fn with_config(storage: Arc<dyn Storage>, config: ScannerConfig) -> Self {
        Self {
            storage,
            config,
            progress: ProgressBus::default(),
            counters: Arc::new(ScanCounters::default()),
        }
    }

    /// Publish progress on the given bus.
    pub fn with_progress(mut self, progress: ProgressBus) -> Self {
        self.progress = progress;
        self
    }

    /// Shared counters of the current scan.
    pub fn counters(&self) -> Arc<ScanCounters> {
        Arc::clone(&self.counters)
    }

    /// Scan a directory tree.
    ///
    /// Never fails on an unreadable directory; such directories end up in
    /// [`ScanReport::errors`].
    pub async fn scan(&self, root: &str) -> Result<ScanReport> {
        let root = spath::normalize(root);
        self.counters.reset();
        self.progress
            .executing(Stage::Scan, 0, 0, format!("Scanning {}", root));

        let mut files: BTreeMap<String, ScannedFile> = BTreeMap::new();
        let mut errors = Vec::new();
        let mut truncated = false;
        let mut listed = 0usize;
        let mut pending = vec![(root.clone(), 0usize)];

        'walk: while let Some((dir, depth)) = pending.pop() {
            if listed > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
            listed += 1;

            let entries = match self.storage.list(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory {}: {}", dir, e);
                    errors.push(ScanError {
                        directory: dir,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let visited = self.counters.directories.fetch_add(1, Ordering::Relaxed) + 1;

            let mut subdirs = Vec::new();
            for entry in entries {
                if parser::is_excluded(&entry.name, &self.config.exclude_patterns) {
                    tracing::debug!("Excluded: {}/{}", dir, entry.name);
                    continue;
                }
                if entry.is_dir {
                    if self.config.recursive && depth < self.config.max_depth {
                        subdirs.push(spath::join(&dir, &entry.name));
                    }
                    continue;
                }

                let Some(kind) = self.config.kind_of(&entry.name) else {
                    continue;
                };
                if kind == FileKind::Video && is_sample_filename(&entry.name) {
                    tracing::debug!("Sample file skipped: {}/{}", dir, entry.name);
                    continue;
                }

                if self.config.max_files > 0 && files.len() >= self.config.max_files {
                    tracing::warn!("File limit {} reached, stopping scan", self.config.max_files);
                    truncated = true;
                    break 'walk;
                }

                let file = scanned_file(&dir, &entry.name, entry.size, kind);
                if files.contains_key(&file.path) {
                    continue;
                }
                match kind {
                    FileKind::Video => self.counters.videos.fetch_add(1, Ordering::Relaxed),
                    FileKind::Subtitle => self.counters.subtitles.fetch_add(1, Ordering::Relaxed),
                };
                files.insert(file.path.clone(), file);
            }

            // Reverse so the stack pops siblings in name order.
            for subdir in subdirs.into_iter().rev() {
                pending.push((subdir, depth + 1));
            }

            if visited % PROGRESS_INTERVAL == 0 {
                let snapshot = self.counters.snapshot();
                self.progress.executing(
                    Stage::Scan,
                    snapshot.directories,
                    0,
                    format!(
                        "{} directories, {} videos, {} subtitles",
                        snapshot.directories, snapshot.videos, snapshot.subtitles
                    ),
                );
            }
        }

        let mut files: Vec<ScannedFile> = files.into_values().collect();
        pair_subtitles(&mut files);

        let report = ScanReport {
            root,
            files,
            errors,
            directories: self.counters.snapshot().directories,
            truncated,
        };

        tracing::info!(
            "Scanned {} directories: {} videos, {} subtitles, {} unreadable",
            report.directories,
            report.video_count(),
            report.subtitle_count(),
            report.errors.len()
        );
        if let Some(failure) = report.errors.iter().find(|e| e.directory == report.root) {
            self.progress.error(
                Stage::Scan,
                format!("Cannot read {}: {}", report.root, failure.reason),
            );
            return Ok(report);
        }
        self.progress.complete(
            Stage::Scan,
            report.files.len(),
            format!(
                "{} videos, {} subtitles",
                report.video_count(),
                report.subtitle_count()
            ),
        );

        Ok(report)
    }
}

/// Attach each subtitle to a video in the same directory.
///
/// Stems are compared with the language tag removed and separators
/// normalized. Without a stem match, a subtitle pairs with the only video of
/// its directory that has the same raw episode, or with the only video of the
/// directory when neither has an episode number.
pub fn pair_subtitles(files: &mut [ScannedFile]) {
    let mut by_stem: HashMap<(String, String), String> = HashMap::new();
    let mut by_dir: HashMap<String, Vec<(String, Option<u32>)>> = HashMap::new();

    for video in files.iter().filter(|f| f.is_video()) {
        by_stem.insert(
            (
                video.directory.clone(),
                parser::pairing_key(parser::stem(&video.name)),
            ),
            video.path.clone(),
        );
        by_dir
            .entry(video.directory.clone())
            .or_default()
            .push((video.path.clone(), video.raw_episode));
    }

    for subtitle in files.iter_mut().filter(|f| f.is_subtitle()) {
        let key = (
            subtitle.directory.clone(),
            parser::pairing_key(parser::subtitle_base(&subtitle.name)),
        );
        let paired = by_stem.get(&key).cloned().or_else(|| {
            let videos = by_dir.get(&subtitle.directory)?;
            let same_episode: Vec<&String> = videos
                .iter()
                .filter(|(_, ep)| ep.is_some() && *ep == subtitle.raw_episode)
                .map(|(path, _)| path)
                .collect();
            match (same_episode.as_slice(), videos.as_slice()) {
                ([only], _) => Some((*only).clone()),
                ([], [(path, None)]) if subtitle.raw_episode.is_none() => Some(path.clone()),
                _ => None,
            }
        });
        if paired.is_none() {
            tracing::debug!("Unpaired subtitle: {}", subtitle.path);
        }
        subtitle.video_ref = paired;
    }
}
