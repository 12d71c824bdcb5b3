//! Classification assembly.
//!
//! Runs the matcher and resolver over a scan and builds one
//! [`Classification`] per classify item. [`classify`] is pure;
//! [`classify_with_provider`] first gathers metadata from a provider.

use crate::core::matcher;
use crate::core::progress::ProgressBus;
use crate::core::resolver;
use crate::models::classify::{
    Classification, ClassificationContent, ClassifiedFile, ClassifyItem, ClassifyOutcome,
    ResolveGap, RuleSet, SubCategory, Titles,
};
use crate::models::media::{MediaType, ScannedFile};
use crate::models::progress::Stage;
use crate::services::metadata::{fetch_season_table, MetadataProvider, MetadataSnapshot};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Load a rules file (TOML, or JSON by extension).
pub fn load_rules(path: &Path) -> Result<RuleSet> {
    let content = std::fs::read_to_string(path)?;
    let rules: RuleSet = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };
    validate_rules(&rules)?;
    Ok(rules)
}

/// Reject rule sets that can never match as intended.
pub fn validate_rules(rules: &RuleSet) -> Result<()> {
    let mut seen = BTreeSet::new();
    for item in &rules.items {
        if !seen.insert((item.id, item.media_type)) {
            return Err(Error::InvalidRules(format!(
                "duplicate item {} ({})",
                item.id, item.media_type
            )));
        }
        for (idx, rule) in item.rules.iter().enumerate() {
            if let Some([min, max]) = rule.matcher.episode_range {
                if min > max {
                    return Err(Error::InvalidRules(format!(
                        "item {} rule {}: episode range [{}, {}] is empty",
                        item.id, idx, min, max
                    )));
                }
            }
        }
        if item.rules.is_empty() {
            tracing::warn!("Item {} ({}) has no rules and will match nothing", item.id, item.name);
        }
    }
    Ok(())
}

fn subtitles_by_video(files: &[ScannedFile]) -> BTreeMap<&str, Vec<ScannedFile>> {
    let mut map: BTreeMap<&str, Vec<ScannedFile>> = BTreeMap::new();
    for subtitle in files.iter().filter(|f| f.is_subtitle()) {
        if let Some(video) = subtitle.video_ref.as_deref() {
            map.entry(video).or_default().push(subtitle.clone());
        }
    }
    for subtitles in map.values_mut() {
        subtitles.sort_by(|a, b| a.path.cmp(&b.path));
    }
    map
}

fn empty_classification(item: &ClassifyItem, metadata: &MetadataSnapshot) -> Classification {
    let details = metadata.details_for(item.id, item.media_type);
    let genres = details.map(|d| d.genres.clone()).unwrap_or_default();
    let content = match item.media_type {
        MediaType::Tv => ClassificationContent::Tv {
            seasons: BTreeMap::new(),
        },
        MediaType::Movie => ClassificationContent::Movie { files: Vec::new() },
    };
    Classification {
        id: item.id,
        name: item.name.clone(),
        year: details.and_then(|d| d.year),
        sub_category: SubCategory::from_genres(&genres),
        genres,
        titles: Titles {
            zh: details.and_then(|d| d.title_zh.clone()),
            en: details.and_then(|d| d.title_en.clone()),
        },
        content,
    }
}

/// Classify scanned files with the given rules and metadata.
///
/// Deterministic: the same inputs give the same output, byte for byte once
/// serialized.
pub fn classify(
    files: &[ScannedFile],
    items: &[ClassifyItem],
    metadata: &MetadataSnapshot,
) -> ClassifyOutcome {
    let matches = matcher::match_files(files, items);
    let mut subtitles = subtitles_by_video(files);

    let mut classifications: Vec<Classification> = items
        .iter()
        .map(|item| empty_classification(item, metadata))
        .collect();
    let mut needs_review = Vec::new();

    for m in &matches.matched {
        let item = &items[m.item];
        let attached = subtitles.remove(m.file.path.as_str()).unwrap_or_default();

        match &mut classifications[m.item].content {
            ClassificationContent::Tv { seasons } => {
                let rule = &item.rules[m.rule];
                match resolver::resolve_episode(
                    m.file.raw_episode,
                    rule,
                    metadata.seasons_for(item.id),
                ) {
                    Ok((season, episode)) => {
                        seasons.entry(season).or_default().push(ClassifiedFile {
                            file: m.file.clone(),
                            season,
                            episode,
                            rule: m.rule,
                            subtitles: attached,
                        });
                    }
                    Err(reason) => {
                        tracing::debug!("Needs review: {} ({})", m.file.path, reason);
                        needs_review.push(ResolveGap {
                            path: m.file.path.clone(),
                            item_id: item.id,
                            raw_episode: m.file.raw_episode,
                            reason,
                        });
                    }
                }
            }
            ClassificationContent::Movie { files } => files.push(ClassifiedFile {
                file: m.file.clone(),
                season: 0,
                episode: 0,
                rule: m.rule,
                subtitles: attached,
            }),
        }
    }

    for classification in &mut classifications {
        match &mut classification.content {
            ClassificationContent::Tv { seasons } => {
                for files in seasons.values_mut() {
                    files.sort_by(|a, b| {
                        a.episode
                            .cmp(&b.episode)
                            .then_with(|| a.file.path.cmp(&b.file.path))
                    });
                }
            }
            ClassificationContent::Movie { files } => {
                files.sort_by(|a, b| a.file.path.cmp(&b.file.path));
            }
        }
    }

    let outcome = ClassifyOutcome {
        classifications,
        unclassified: matches
            .unclassified
            .iter()
            .map(|f| f.path.clone())
            .collect(),
        needs_review,
    };

    tracing::info!(
        "Classified {} files into {} items; {} unclassified, {} need review",
        outcome
            .classifications
            .iter()
            .map(Classification::file_count)
            .sum::<usize>(),
        outcome.classifications.len(),
        outcome.unclassified.len(),
        outcome.needs_review.len()
    );

    outcome
}

/// Fetch details and season tables for every item, once per id and media
/// type.
///
/// A failed lookup leaves the item without metadata; its auto-season files
/// are then flagged instead of guessed.
pub async fn gather_metadata(
    items: &[ClassifyItem],
    provider: &dyn MetadataProvider,
    progress: &ProgressBus,
) -> MetadataSnapshot {
    let mut snapshot = MetadataSnapshot::default();
    let unique: BTreeSet<(u64, MediaType)> =
        items.iter().map(|item| (item.id, item.media_type)).collect();
    let total = unique.len();

    for (idx, (id, media_type)) in unique.into_iter().enumerate() {
        progress.executing(
            Stage::Classify,
            idx,
            total,
            format!("Fetching metadata for {}", id),
        );

        let details = match provider.details(id, media_type).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!("No metadata for {} {}: {}", media_type, id, e);
                continue;
            }
        };

        if media_type == MediaType::Tv {
            match fetch_season_table(provider, id, details.season_count).await {
                Ok(table) => {
                    snapshot.seasons.insert(id, table);
                }
                Err(e) => tracing::warn!("No season data for {}: {}", id, e),
            }
        }
        snapshot.details.insert((id, media_type), details);
    }

    snapshot
}

/// Gather metadata from `provider`, then classify.
pub async fn classify_with_provider(
    files: &[ScannedFile],
    items: &[ClassifyItem],
    provider: &dyn MetadataProvider,
    progress: &ProgressBus,
) -> ClassifyOutcome {
    let metadata = gather_metadata(items, provider, progress).await;
    let outcome = classify(files, items, &metadata);
    progress.complete(
        Stage::Classify,
        outcome.classifications.len(),
        format!(
            "{} unclassified, {} need review",
            outcome.unclassified.len(),
            outcome.needs_review.len()
        ),
    );
    outcome
}
