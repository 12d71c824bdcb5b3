//! Media-related data models.

use serde::{Deserialize, Serialize};

/// Media type enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Tv,
    Movie,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Tv => write!(f, "tv"),
            MediaType::Movie => write!(f, "movie"),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "tv" | "tvshow" | "tvshows" | "series" => Ok(MediaType::Tv),
            "movie" | "movies" | "film" => Ok(MediaType::Movie),
            other => Err(crate::Error::other(format!("unknown media type: {}", other))),
        }
    }
}

/// Scanned file kind, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Video,
    Subtitle,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Video => write!(f, "video"),
            FileKind::Subtitle => write!(f, "subtitle"),
        }
    }
}

/// A file found by the scanner.
///
/// Paths use `/` separators and are rooted at the storage root. A scan never
/// yields two entries with the same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Full path on the storage.
    pub path: String,
    /// File name without directory.
    pub name: String,
    /// Video or subtitle.
    pub kind: FileKind,
    /// File size in bytes.
    pub size: u64,
    /// Parent directory.
    pub directory: String,
    /// Provisional episode number taken from the file name.
    pub raw_episode: Option<u32>,
    /// Normalized subtitle language tag (`chs`, `cht`, `eng`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Path of the video this subtitle belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_ref: Option<String>,
}

impl ScannedFile {
    pub fn is_video(&self) -> bool {
        self.kind == FileKind::Video
    }

    pub fn is_subtitle(&self) -> bool {
        self.kind == FileKind::Subtitle
    }

    /// File extension, lowercase, without the dot.
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}

/// Unreachable directory recorded during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    pub directory: String,
    pub reason: String,
}

/// Result of a scan: the inventory plus the directories that could not be read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Scanned root.
    pub root: String,
    /// Files sorted by path.
    pub files: Vec<ScannedFile>,
    /// Directories skipped because they could not be listed.
    pub errors: Vec<ScanError>,
    /// Number of directories listed.
    pub directories: usize,
    /// Whether the file limit stopped the scan early.
    pub truncated: bool,
}

impl ScanReport {
    pub fn videos(&self) -> impl Iterator<Item = &ScannedFile> {
        self.files.iter().filter(|f| f.is_video())
    }

    pub fn subtitles(&self) -> impl Iterator<Item = &ScannedFile> {
        self.files.iter().filter(|f| f.is_subtitle())
    }

    pub fn video_count(&self) -> usize {
        self.videos().count()
    }

    pub fn subtitle_count(&self) -> usize {
        self.subtitles().count()
    }

    /// Subtitles paired to the given video path, sorted by path.
    pub fn subtitles_for(&self, video_path: &str) -> Vec<&ScannedFile> {
        self.subtitles()
            .filter(|s| s.video_ref.as_deref() == Some(video_path))
            .collect()
    }
}

/// Search hit returned by a metadata provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    pub name: String,
    pub year: Option<u16>,
    pub media_type: MediaType,
}

/// Descriptive metadata for one series or movie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDetails {
    pub id: u64,
    /// Chinese title.
    pub title_zh: Option<String>,
    /// English title.
    pub title_en: Option<String>,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    /// Number of regular seasons (specials not counted).
    pub season_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_parse() {
        assert_eq!("TV".parse::<MediaType>().unwrap(), MediaType::Tv);
        assert_eq!("movies".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert!("music".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_extension() {
        let file = ScannedFile {
            path: "/a/Show.S01E01.CHS.SRT".into(),
            name: "Show.S01E01.CHS.SRT".into(),
            kind: FileKind::Subtitle,
            size: 10,
            directory: "/a".into(),
            raw_episode: Some(1),
            language: Some("chs".into()),
            video_ref: None,
        };
        assert_eq!(file.extension(), "srt");
    }
}
