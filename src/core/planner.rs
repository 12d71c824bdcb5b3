//! Plan generation module.
//!
//! Turns classifications into an ordered list of storage operations. Planning
//! is pure: pointer locators are resolved beforehand by
//! [`resolve_locators`] and passed in, and nothing here touches storage.
//!
//! Layout below the target root:
//!
//! ```text
//! <type>/<category>/<Series (Year)>/Season 01/Series S01E02.mkv
//! <type>/<category>/<Title (Year)>/Title (Year).mkv
//! ```

use crate::generators::{filename, folder, pointer};
use crate::models::classify::{Classification, ClassificationContent, ClassifiedFile};
use crate::models::config::{Config, NamingLanguage, PointerConfig, TransferMode};
use crate::models::media::{MediaType, ScannedFile};
use crate::models::plan::{FileRole, OperationKind, Plan, PlanConflict, PlanMode, PlannedOperation};
use crate::services::storage::Storage;
use crate::utils::path as spath;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashSet};

/// Preferred languages for the default subtitle, best first.
const SUBTITLE_PRIORITY: &[&str] = &[
    "chs", "chsjp", "scjp", "chs_jp", "cht", "chtjp", "tcjp", "cht_jp", "eng", "jpn", "kor",
];

/// Source path → locator, for pointer mode.
pub type Locators = BTreeMap<String, String>;

/// Planner configuration.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub mode: PlanMode,
    pub target_root: String,
    pub naming_language: NamingLanguage,
    pub transfer: TransferMode,
    pub categorize: bool,
}

impl PlannerConfig {
    /// Planner settings for `mode`. Fails when the mode has no target root.
    pub fn from_config(config: &Config, mode: PlanMode) -> Result<Self> {
        let target_root = config.target_root(mode).ok_or_else(|| {
            Error::config(format!(
                "no target root for {} mode (set targets.{})",
                mode, mode
            ))
        })?;
        Ok(Self {
            mode,
            target_root: spath::normalize(target_root),
            naming_language: config.naming_language,
            transfer: config.transfer,
            categorize: config.categorize,
        })
    }
}

/// Collects operations, numbering them and refusing duplicate destinations.
struct PlanBuilder {
    operations: Vec<PlannedOperation>,
    conflicts: Vec<PlanConflict>,
    destinations: HashSet<String>,
}

impl PlanBuilder {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
            conflicts: Vec::new(),
            destinations: HashSet::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        kind: OperationKind,
        role: FileRole,
        source: &str,
        destination: String,
        content: Option<String>,
        media_type: MediaType,
        title: &str,
    ) {
        if !self.destinations.insert(destination.clone()) {
            tracing::warn!("Destination already planned, skipping: {}", destination);
            self.conflicts.push(PlanConflict {
                source: source.to_string(),
                destination,
                reason: "destination already planned".to_string(),
            });
            return;
        }
        self.operations.push(PlannedOperation {
            id: format!("op-{:04}", self.operations.len() + 1),
            kind,
            role,
            source: source.to_string(),
            destination,
            content,
            media_type,
            title: title.to_string(),
        });
    }

    fn skip(&mut self, source: &str, reason: &str) {
        self.conflicts.push(PlanConflict {
            source: source.to_string(),
            destination: String::new(),
            reason: reason.to_string(),
        });
    }
}

fn subtitle_rank(subtitle: &ScannedFile) -> usize {
    match subtitle.language.as_deref() {
        Some(lang) => SUBTITLE_PRIORITY
            .iter()
            .position(|p| *p == lang)
            .unwrap_or(SUBTITLE_PRIORITY.len()),
        None => SUBTITLE_PRIORITY.len(),
    }
}

/// Subtitle copied as the untagged default: best language, then path.
pub fn default_subtitle(subtitles: &[ScannedFile]) -> Option<&ScannedFile> {
    subtitles
        .iter()
        .min_by(|a, b| subtitle_rank(a).cmp(&subtitle_rank(b)).then_with(|| a.path.cmp(&b.path)))
}

/// Directory that holds a classification's files (season folder excluded).
fn title_directory(
    classification: &Classification,
    title: &str,
    config: &PlannerConfig,
) -> String {
    let media_type = classification.media_type();
    let mut dir = config.target_root.clone();
    if config.categorize {
        dir = spath::join(&dir, folder::type_directory(media_type, config.naming_language));
        dir = spath::join(
            &dir,
            folder::category_directory(
                media_type,
                classification.sub_category,
                config.naming_language,
            ),
        );
    }
    spath::join(&dir, &folder::title_folder(title, classification.year))
}

#[allow(clippy::too_many_arguments)]
fn plan_file(
    builder: &mut PlanBuilder,
    classified: &ClassifiedFile,
    directory: &str,
    stem: &str,
    media_type: MediaType,
    title: &str,
    config: &PlannerConfig,
    locators: &Locators,
) {
    let source = &classified.file;
    let transfer_kind = match config.transfer {
        TransferMode::Copy => OperationKind::Copy,
        TransferMode::Move => OperationKind::Move,
    };

    let subtitle_kind = match config.mode {
        PlanMode::Organize => {
            let name = filename::with_extension(stem, &source.extension());
            builder.push(
                transfer_kind,
                FileRole::Video,
                &source.path,
                spath::join(directory, &name),
                None,
                media_type,
                title,
            );
            transfer_kind
        }
        PlanMode::Pointer => {
            let Some(locator) = locators.get(&source.path) else {
                builder.skip(&source.path, "no locator for source");
                return;
            };
            builder.push(
                OperationKind::CreatePointer,
                FileRole::Video,
                &source.path,
                spath::join(directory, &pointer::pointer_filename(stem)),
                Some(pointer::pointer_content(locator)),
                media_type,
                title,
            );
            OperationKind::Copy
        }
    };

    if let Some(default) = default_subtitle(&classified.subtitles) {
        let name = filename::with_extension(stem, &default.extension());
        builder.push(
            OperationKind::Copy,
            FileRole::DefaultSubtitle,
            &default.path,
            spath::join(directory, &name),
            None,
            media_type,
            title,
        );
    }
    for subtitle in &classified.subtitles {
        let name = filename::subtitle_filename(
            stem,
            subtitle.language.as_deref(),
            &subtitle.extension(),
        );
        builder.push(
            subtitle_kind,
            FileRole::Subtitle,
            &subtitle.path,
            spath::join(directory, &name),
            None,
            media_type,
            title,
        );
    }
}

/// Build the plan for a set of classifications.
///
/// Deterministic for identical inputs. Files that would collide with an
/// already planned destination, and pointer sources without a locator, are
/// reported in [`Plan::conflicts`] instead of being planned.
pub fn plan(
    classifications: &[Classification],
    config: &PlannerConfig,
    locators: &Locators,
) -> Plan {
    let mut builder = PlanBuilder::new();

    for classification in classifications {
        let media_type = classification.media_type();
        let title = filename::display_title(classification, config.naming_language);
        let base = title_directory(classification, &title, config);

        match &classification.content {
            ClassificationContent::Tv { seasons } => {
                for (&season, files) in seasons {
                    let directory = spath::join(&base, &folder::season_folder(season));
                    for classified in files {
                        let stem = filename::episode_stem(&title, season, classified.episode);
                        plan_file(
                            &mut builder,
                            classified,
                            &directory,
                            &stem,
                            media_type,
                            &title,
                            config,
                            locators,
                        );
                    }
                }
            }
            ClassificationContent::Movie { files } => {
                let multi_part = files.len() > 1;
                for (idx, classified) in files.iter().enumerate() {
                    let disc = multi_part.then(|| {
                        filename::extract_disc_identifier(&classified.file.name)
                            .unwrap_or_else(|| format!("part{}", idx + 1))
                    });
                    let stem = filename::movie_stem(&title, classification.year, disc.as_deref());
                    plan_file(
                        &mut builder,
                        classified,
                        &base,
                        &stem,
                        media_type,
                        &title,
                        config,
                        locators,
                    );
                }
            }
        }
    }

    tracing::info!(
        "Planned {} operations ({} conflicts) in {} mode",
        builder.operations.len(),
        builder.conflicts.len(),
        config.mode
    );

    Plan {
        mode: config.mode,
        target_root: config.target_root.clone(),
        operations: builder.operations,
        conflicts: builder.conflicts,
    }
}

/// Resolve pointer locators for every classified video.
///
/// With a configured base URL locators are built from the template; otherwise
/// each is asked from the storage. Videos without a locator are left out and
/// show up as plan conflicts.
pub async fn resolve_locators(
    classifications: &[Classification],
    pointer_config: &PointerConfig,
    storage: &dyn Storage,
) -> Locators {
    let mut locators = Locators::new();
    for classified in classifications.iter().flat_map(|c| c.files()) {
        let path = &classified.file.path;
        let locator = match pointer_config.base_url.as_deref() {
            Some(base) => pointer::build_locator(base, pointer_config.flavor, path),
            None => match storage.reference(path).await {
                Ok(locator) => locator,
                Err(e) => {
                    tracing::warn!("No locator for {}: {}", path, e);
                    continue;
                }
            },
        };
        locators.insert(path.clone(), locator);
    }
    locators
}

/// Load a plan file.
pub fn load_plan(path: &std::path::Path) -> Result<Plan> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| Error::InvalidPlanFile(e.to_string()))
}

/// Save a plan file.
pub fn save_plan(plan: &Plan, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(plan)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classify::{SubCategory, Titles};
    use crate::models::media::FileKind;

    fn scanned(path: &str, kind: FileKind, language: Option<&str>) -> ScannedFile {
        let (dir, name) = path.rsplit_once('/').unwrap();
        ScannedFile {
            path: path.into(),
            name: name.into(),
            kind,
            size: 1,
            directory: dir.into(),
            raw_episode: None,
            language: language.map(String::from),
            video_ref: None,
        }
    }

    fn config(mode: PlanMode, transfer: TransferMode) -> PlannerConfig {
        PlannerConfig {
            mode,
            target_root: "/lib".into(),
            naming_language: NamingLanguage::En,
            transfer,
            categorize: false,
        }
    }

    fn movie(files: Vec<ClassifiedFile>) -> Classification {
        Classification {
            id: 1,
            name: "Film".into(),
            year: Some(2001),
            genres: vec![],
            titles: Titles::default(),
            sub_category: SubCategory::Default,
            content: ClassificationContent::Movie { files },
        }
    }

    fn classified(path: &str, subtitles: Vec<ScannedFile>) -> ClassifiedFile {
        ClassifiedFile {
            file: scanned(path, FileKind::Video, None),
            season: 0,
            episode: 0,
            rule: 0,
            subtitles,
        }
    }

    #[test]
    fn test_default_subtitle_priority() {
        let subs = vec![
            scanned("/m/a.eng.srt", FileKind::Subtitle, Some("eng")),
            scanned("/m/a.cht.srt", FileKind::Subtitle, Some("cht")),
            scanned("/m/a.srt", FileKind::Subtitle, None),
        ];
        assert_eq!(default_subtitle(&subs).unwrap().path, "/m/a.cht.srt");
        assert!(default_subtitle(&[]).is_none());
    }

    #[test]
    fn test_move_mode_copies_default_before_moving() {
        let subs = vec![scanned("/m/a.chs.srt", FileKind::Subtitle, Some("chs"))];
        let plan = plan(
            &[movie(vec![classified("/m/a.mkv", subs)])],
            &config(PlanMode::Organize, TransferMode::Move),
            &Locators::new(),
        );

        let ops: Vec<(OperationKind, &str)> = plan
            .operations
            .iter()
            .map(|op| (op.kind, op.destination.as_str()))
            .collect();
        assert_eq!(
            ops,
            vec![
                (OperationKind::Move, "/lib/Film (2001)/Film (2001).mkv"),
                (OperationKind::Copy, "/lib/Film (2001)/Film (2001).srt"),
                (OperationKind::Move, "/lib/Film (2001)/Film (2001).chs.srt"),
            ]
        );
        assert_eq!(plan.operations[0].id, "op-0001");
    }

    #[test]
    fn test_multi_part_movie_gets_disc_suffix() {
        let plan = plan(
            &[movie(vec![
                classified("/m/Film.CD1.mkv", vec![]),
                classified("/m/Film.CD2.mkv", vec![]),
            ])],
            &config(PlanMode::Organize, TransferMode::Copy),
            &Locators::new(),
        );
        assert_eq!(plan.operations[0].destination, "/lib/Film (2001)/Film (2001) - cd1.mkv");
        assert_eq!(plan.operations[1].destination, "/lib/Film (2001)/Film (2001) - cd2.mkv");
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn test_pointer_without_locator_is_reported() {
        let plan = plan(
            &[movie(vec![classified("/m/a.mkv", vec![])])],
            &config(PlanMode::Pointer, TransferMode::Copy),
            &Locators::new(),
        );
        assert!(plan.operations.is_empty());
        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(plan.conflicts[0].source, "/m/a.mkv");
    }

    #[test]
    fn test_missing_target_root_is_config_error() {
        let config = Config::default();
        let err = PlannerConfig::from_config(&config, PlanMode::Organize).unwrap_err();
        assert!(err.is_fatal_config());
    }
}
