//! Configuration model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::plan::PlanMode;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language used for titles and library directory names.
    pub naming_language: NamingLanguage,
    /// Copy or move media in organize mode.
    pub transfer: TransferMode,
    /// Split the library into type and genre directories.
    pub categorize: bool,
    /// Seconds to wait between consecutive writes.
    pub upload_delay: f64,
    /// Scanner configuration.
    pub scan: ScanConfig,
    /// Target roots.
    pub targets: TargetRoots,
    /// Pointer locator template.
    pub pointer: PointerConfig,
    /// TMDB configuration.
    pub tmdb: TmdbConfig,
    /// History ledger file.
    pub history_path: PathBuf,
    /// Verify local copies with SHA-256.
    pub verify_copies: bool,
}

/// Naming language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingLanguage {
    #[default]
    Zh,
    En,
}

/// Copy-vs-move mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

/// Scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Seconds to wait before each directory listing after the first.
    pub delay: f64,
    /// Maximum directory depth below the root.
    pub max_depth: usize,
    /// Stop after this many media files (0 = unlimited).
    pub max_files: usize,
    /// Video extensions, lowercase without dot.
    pub video_extensions: Vec<String>,
    /// Subtitle extensions, lowercase without dot.
    pub subtitle_extensions: Vec<String>,
    /// Names to skip. `.*` skips every dot-entry.
    pub exclude_patterns: Vec<String>,
}

/// Library roots on the target storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetRoots {
    /// Root for organize mode.
    pub organize: Option<String>,
    /// Root for pointer mode.
    pub pointer: Option<String>,
}

/// How pointer locators are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorFlavor {
    /// `{base}/d{path}`
    #[default]
    Alist,
    /// `{base}/dav{path}`
    Webdav,
    /// `{base}{path}`
    Raw,
}

/// Pointer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Base URL of the remote service. Without it locators come from the
    /// storage backend.
    pub base_url: Option<String>,
    pub flavor: LocatorFlavor,
}

/// TMDB configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// API key.
    pub api_key: Option<String>,
    /// Language for responses.
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming_language: NamingLanguage::default(),
            transfer: TransferMode::default(),
            categorize: true,
            upload_delay: 0.0,
            scan: ScanConfig::default(),
            targets: TargetRoots::default(),
            pointer: PointerConfig::default(),
            tmdb: TmdbConfig::default(),
            history_path: dirs_config_path().join("history.json"),
            verify_copies: true,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            delay: 0.0,
            max_depth: 10,
            max_files: 0,
            video_extensions: to_strings(&[
                "mkv", "mp4", "avi", "mov", "wmv", "flv", "m4v", "ts", "rmvb", "webm", "iso",
            ]),
            subtitle_extensions: to_strings(&[
                "srt", "ass", "ssa", "sub", "idx", "vtt", "smi", "sup",
            ]),
            exclude_patterns: to_strings(&[
                ".*",
                "@eaDir",
                "#recycle",
                ".@__thumb",
                "lost+found",
                "System Volume Information",
                "$RECYCLE.BIN",
                "Thumbs.db",
                ".DS_Store",
            ]),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("TMDB_API_KEY").ok(),
            language: "zh-CN".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn delay(&self) -> Duration {
        secs(self.delay)
    }
}

impl Config {
    pub fn upload_delay(&self) -> Duration {
        secs(self.upload_delay)
    }

    /// Target root for a plan mode.
    pub fn target_root(&self, mode: PlanMode) -> Option<&str> {
        let root = match mode {
            PlanMode::Organize => self.targets.organize.as_deref(),
            PlanMode::Pointer => self.targets.pointer.as_deref(),
        };
        root.filter(|r| !r.trim().is_empty())
    }
}

fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Get the configuration directory path.
pub fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("strm_organizer")
}

/// Load configuration from the default location.
pub fn load_config() -> Config {
    let config_path = dirs_config_path().join("config.toml");

    if config_path.exists() {
        if let Ok(config) = load_config_from(&config_path) {
            return config;
        }
        tracing::warn!("Ignoring unreadable config: {}", config_path.display());
    }

    Config::default()
}

/// Load configuration from an explicit file. Missing keys take defaults.
pub fn load_config_from(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}
