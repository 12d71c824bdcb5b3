//! Rule and classification data models.
//!
//! Rules are plain serializable predicate structs so a rule file can be
//! written by hand, diffed, and replayed in tests.

use super::media::{MediaType, ScannedFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Predicates a file must satisfy. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    /// Substring of the file's directory (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Substring of the file name (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Inclusive raw episode range `[min, max]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_range: Option<[u32; 2]>,
    /// File must be strictly larger than this many MiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mb_greater: Option<u64>,
}

/// How a matched file gets its season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonAssignment {
    /// Season pinned by the rule; episode = raw + offset.
    Fixed(u32),
    /// Season derived from the per-season episode counts.
    Auto,
}

impl Default for SeasonAssignment {
    fn default() -> Self {
        SeasonAssignment::Fixed(1)
    }
}

/// A match rule plus the season assignment it implies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyRule {
    #[serde(rename = "match", default)]
    pub matcher: MatchRule,
    #[serde(default)]
    pub season: SeasonAssignment,
    #[serde(default)]
    pub episode_offset: i32,
}

/// One series or movie and the ordered rules that select its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyItem {
    /// Metadata provider identifier.
    pub id: u64,
    /// Display name, used when the provider has no title.
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub rules: Vec<ClassifyRule>,
}

/// A rules file: classify items in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub items: Vec<ClassifyItem>,
}

/// Episode counts per season number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonTable(pub BTreeMap<u32, u32>);

impl SeasonTable {
    pub fn from_counts<I: IntoIterator<Item = (u32, u32)>>(counts: I) -> Self {
        Self(counts.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|&count| count == 0)
    }
}

/// A video placed at a season/episode, with its subtitles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFile {
    pub file: ScannedFile,
    /// Resolved season (0 for movie files).
    pub season: u32,
    /// Resolved episode (0 for movie files).
    pub episode: u32,
    /// Index of the rule that claimed the file.
    pub rule: usize,
    pub subtitles: Vec<ScannedFile>,
}

/// Localized titles carried through to naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Titles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

/// Library sub-category derived from genre tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubCategory {
    Animation,
    Documentary,
    Music,
    Variety,
    #[default]
    Default,
}

impl SubCategory {
    /// First recognized genre wins.
    pub fn from_genres(genres: &[String]) -> Self {
        for genre in genres {
            let category = match genre.as_str() {
                "Animation" | "动画" => Some(SubCategory::Animation),
                "Documentary" | "纪录" | "纪录片" => Some(SubCategory::Documentary),
                "Music" | "音乐" => Some(SubCategory::Music),
                "Reality" | "Talk" | "真人秀" | "脱口秀" => Some(SubCategory::Variety),
                _ => None,
            };
            if let Some(category) = category {
                return category;
            }
        }
        SubCategory::Default
    }
}

/// Files of a classification: seasons for tv, a flat list for movies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClassificationContent {
    Tv {
        seasons: BTreeMap<u32, Vec<ClassifiedFile>>,
    },
    Movie {
        files: Vec<ClassifiedFile>,
    },
}

/// Everything known about one classify item after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub id: u64,
    pub name: String,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    pub titles: Titles,
    pub sub_category: SubCategory,
    pub content: ClassificationContent,
}

impl Classification {
    pub fn media_type(&self) -> MediaType {
        match self.content {
            ClassificationContent::Tv { .. } => MediaType::Tv,
            ClassificationContent::Movie { .. } => MediaType::Movie,
        }
    }

    /// All classified files in output order.
    pub fn files(&self) -> Vec<&ClassifiedFile> {
        match &self.content {
            ClassificationContent::Tv { seasons } => seasons.values().flatten().collect(),
            ClassificationContent::Movie { files } => files.iter().collect(),
        }
    }

    pub fn file_count(&self) -> usize {
        match &self.content {
            ClassificationContent::Tv { seasons } => seasons.values().map(Vec::len).sum(),
            ClassificationContent::Movie { files } => files.len(),
        }
    }
}

/// Why a matched file could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveGapReason {
    /// The provider has no season data for the item.
    NoSeasonData,
    /// Raw episode lies past the last known season.
    BeyondLastSeason,
    /// A tv file without a raw episode number.
    MissingEpisode,
    /// The offset moved the episode below 1.
    EpisodeBelowOne,
}

impl std::fmt::Display for ResolveGapReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveGapReason::NoSeasonData => write!(f, "no season data"),
            ResolveGapReason::BeyondLastSeason => write!(f, "past the last known season"),
            ResolveGapReason::MissingEpisode => write!(f, "no episode number"),
            ResolveGapReason::EpisodeBelowOne => write!(f, "offset gives episode below 1"),
        }
    }
}

/// A matched file flagged for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveGap {
    pub path: String,
    pub item_id: u64,
    pub raw_episode: Option<u32>,
    pub reason: ResolveGapReason,
}

/// Output of one classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyOutcome {
    pub classifications: Vec<Classification>,
    /// Video paths no item claimed.
    pub unclassified: Vec<String>,
    pub needs_review: Vec<ResolveGap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_category_first_genre_wins() {
        let genres = vec!["Drama".to_string(), "动画".to_string(), "Music".to_string()];
        assert_eq!(SubCategory::from_genres(&genres), SubCategory::Animation);
        assert_eq!(SubCategory::from_genres(&[]), SubCategory::Default);
    }

    #[test]
    fn test_rule_set_from_toml() {
        let content = r#"
[[items]]
id = 1399
name = "Show"
type = "tv"

[[items.rules]]
season = "auto"
episode_offset = -2
[items.rules.match]
directory = "Show"
episode_range = [3, 20]

[[items.rules]]
season = { fixed = 0 }
[items.rules.match]
filename = "SP"
"#;
        let rules: RuleSet = toml::from_str(content).unwrap();
        let item = &rules.items[0];
        assert_eq!(item.media_type, MediaType::Tv);
        assert_eq!(item.rules.len(), 2);
        assert_eq!(item.rules[0].season, SeasonAssignment::Auto);
        assert_eq!(item.rules[0].episode_offset, -2);
        assert_eq!(item.rules[0].matcher.episode_range, Some([3, 20]));
        assert_eq!(item.rules[1].season, SeasonAssignment::Fixed(0));
        assert_eq!(item.rules[1].matcher.filename.as_deref(), Some("SP"));
    }

    #[test]
    fn test_season_table_empty() {
        assert!(SeasonTable::default().is_empty());
        assert!(!SeasonTable::from_counts([(1, 12)]).is_empty());
    }
}
