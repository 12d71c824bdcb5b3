//! Metadata capability.
//!
//! Providers answer searches and report per-season episode counts. The
//! classifier only needs [`MediaDetails`] and a [`SeasonTable`] per item.

use crate::models::classify::SeasonTable;
use crate::models::media::{Candidate, MediaDetails, MediaType};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Metadata lookups used by classification.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search by title.
    async fn search(&self, query: &str, media_type: MediaType) -> Result<Vec<Candidate>>;

    /// Titles, year, genres and season count.
    async fn details(&self, id: u64, media_type: MediaType) -> Result<MediaDetails>;

    /// Number of episodes in one season.
    async fn season_episode_count(&self, id: u64, season: u32) -> Result<u32>;
}

/// Fetch the episode counts of every regular season of a series.
///
/// Specials (season 0) are never part of the table.
pub async fn fetch_season_table(
    provider: &dyn MetadataProvider,
    id: u64,
    season_count: u32,
) -> Result<SeasonTable> {
    let lookups = (1..=season_count).map(|season| async move {
        provider
            .season_episode_count(id, season)
            .await
            .map(|count| (season, count))
    });
    let counts = futures::future::try_join_all(lookups).await?;
    Ok(SeasonTable::from_counts(counts))
}

/// One entry of a static metadata file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticEntry {
    pub details: MediaDetails,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    /// Episode count per season number.
    #[serde(default)]
    pub seasons: SeasonTable,
}

/// Metadata from a fixed table, loaded from JSON or built in code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticMetadata {
    pub entries: Vec<StaticEntry>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series with the given episode counts for seasons 1..=n.
    pub fn with_series(mut self, id: u64, title: &str, counts: &[u32]) -> Self {
        let seasons = SeasonTable::from_counts(
            counts
                .iter()
                .enumerate()
                .map(|(idx, &count)| (idx as u32 + 1, count)),
        );
        self.entries.push(StaticEntry {
            details: MediaDetails {
                id,
                title_en: Some(title.to_string()),
                season_count: counts.len() as u32,
                ..MediaDetails::default()
            },
            media_type: Some(MediaType::Tv),
            seasons,
        });
        self
    }

    /// Add an entry with full details.
    pub fn with_entry(mut self, entry: StaticEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Load a JSON file of entries.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let metadata = serde_json::from_str(&content)?;
        Ok(metadata)
    }

    /// Entry for `id`. Entries without a media type answer for both.
    fn entry(&self, id: u64, media_type: MediaType) -> Result<&StaticEntry> {
        self.entries
            .iter()
            .find(|e| e.details.id == id && e.media_type.map_or(true, |t| t == media_type))
            .ok_or(Error::MetadataNotFound(id))
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadata {
    async fn search(&self, query: &str, media_type: MediaType) -> Result<Vec<Candidate>> {
        let query = query.to_lowercase();
        let hits = self
            .entries
            .iter()
            .filter(|e| e.media_type.map_or(true, |t| t == media_type))
            .filter_map(|e| {
                let titles = [&e.details.title_zh, &e.details.title_en];
                let name = titles
                    .iter()
                    .filter_map(|t| t.as_deref())
                    .find(|t| t.to_lowercase().contains(&query))?;
                Some(Candidate {
                    id: e.details.id,
                    name: name.to_string(),
                    year: e.details.year,
                    media_type,
                })
            })
            .collect();
        Ok(hits)
    }

    async fn details(&self, id: u64, media_type: MediaType) -> Result<MediaDetails> {
        Ok(self.entry(id, media_type)?.details.clone())
    }

    async fn season_episode_count(&self, id: u64, season: u32) -> Result<u32> {
        let entry = self.entry(id, MediaType::Tv)?;
        entry
            .seasons
            .0
            .get(&season)
            .copied()
            .ok_or_else(|| Error::other(format!("season {} of {} unknown", season, id)))
    }
}

/// Details and season tables gathered once per item.
///
/// Keyed by id and media type: tv and movie ids are separate namespaces.
#[derive(Debug, Clone, Default)]
pub struct MetadataSnapshot {
    pub details: BTreeMap<(u64, MediaType), MediaDetails>,
    pub seasons: BTreeMap<u64, SeasonTable>,
}

impl MetadataSnapshot {
    pub fn details_for(&self, id: u64, media_type: MediaType) -> Option<&MediaDetails> {
        self.details.get(&(id, media_type))
    }

    /// Season table of a series.
    pub fn seasons_for(&self, id: u64) -> Option<&SeasonTable> {
        self.seasons.get(&id)
    }
}
