//! End-to-end tests: scan, classify, plan and apply against in-memory
//! storage and static metadata.

use std::sync::Arc;
use strm_organizer::core::classifier;
use strm_organizer::core::executor::Executor;
use strm_organizer::core::history::HistoryLedger;
use strm_organizer::core::planner::{self, Locators, PlannerConfig};
use strm_organizer::core::progress::ProgressBus;
use strm_organizer::core::scanner::Scanner;
use strm_organizer::models::classify::{
    ClassificationContent, ClassifyItem, ClassifyOutcome, ClassifyRule, MatchRule, RuleSet,
    SeasonAssignment,
};
use strm_organizer::models::config::{
    Config, LocatorFlavor, NamingLanguage, PointerConfig, TransferMode,
};
use strm_organizer::models::media::{MediaType, ScanReport};
use strm_organizer::models::plan::{OperationKind, PlanMode};
use strm_organizer::services::memory::MemoryStorage;
use strm_organizer::services::metadata::StaticMetadata;

fn show_storage() -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::new());
    storage.add_file("/Show/Show S01E01.mkv", 64);
    storage.add_file("/Show/Show S01E02.mkv", 64);
    storage.insert("/Show/Show.S01E01.chs.srt", "1\n00:00:01,000 --> 00:00:02,000\nhi\n");
    storage
}

fn show_item() -> ClassifyItem {
    ClassifyItem {
        id: 1,
        name: "Show".into(),
        media_type: MediaType::Tv,
        rules: vec![ClassifyRule {
            matcher: MatchRule {
                directory: Some("Show".into()),
                ..MatchRule::default()
            },
            season: SeasonAssignment::Auto,
            episode_offset: 0,
        }],
    }
}

async fn scan(storage: &Arc<MemoryStorage>) -> ScanReport {
    Scanner::new(storage.clone()).scan("/").await.unwrap()
}

async fn classify_show(storage: &Arc<MemoryStorage>) -> ClassifyOutcome {
    let report = scan(storage).await;
    let metadata = StaticMetadata::new().with_series(1, "Show", &[2]);
    classifier::classify_with_provider(
        &report.files,
        &[show_item()],
        &metadata,
        &ProgressBus::default(),
    )
    .await
}

fn planner_config(mode: PlanMode, root: &str) -> PlannerConfig {
    PlannerConfig {
        mode,
        target_root: root.into(),
        naming_language: NamingLanguage::En,
        transfer: TransferMode::Move,
        categorize: false,
    }
}

#[tokio::test]
async fn test_show_classifies_into_one_season() {
    let storage = show_storage();
    let outcome = classify_show(&storage).await;

    assert!(outcome.unclassified.is_empty());
    assert!(outcome.needs_review.is_empty());
    let ClassificationContent::Tv { seasons } = &outcome.classifications[0].content else {
        panic!("expected tv content");
    };
    assert_eq!(seasons.len(), 1);
    let season = &seasons[&1];
    assert_eq!(season.len(), 2);
    assert_eq!(season[0].episode, 1);
    assert_eq!(season[0].subtitles.len(), 1);
    assert_eq!(season[0].subtitles[0].name, "Show.S01E01.chs.srt");
    assert_eq!(season[1].episode, 2);
    assert!(season[1].subtitles.is_empty());
}

#[tokio::test]
async fn test_cumulative_seasons_and_gap() {
    let storage = Arc::new(MemoryStorage::new());
    for raw in [1, 12, 13, 22, 23] {
        storage.add_file(&format!("/Show/[Sub] Show - {:02} [1080p].mkv", raw), 8);
    }
    let report = scan(&storage).await;
    let metadata = StaticMetadata::new().with_series(1, "Show", &[12, 10]);
    let outcome = classifier::classify_with_provider(
        &report.files,
        &[show_item()],
        &metadata,
        &ProgressBus::default(),
    )
    .await;

    let ClassificationContent::Tv { seasons } = &outcome.classifications[0].content else {
        panic!("expected tv content");
    };
    let placed: Vec<(u32, u32)> = seasons
        .values()
        .flatten()
        .map(|f| (f.season, f.episode))
        .collect();
    assert_eq!(placed, vec![(1, 1), (1, 12), (2, 1), (2, 10)]);
    assert_eq!(outcome.needs_review.len(), 1);
    assert_eq!(outcome.needs_review[0].raw_episode, Some(23));
}

#[tokio::test]
async fn test_classification_is_byte_identical() {
    let storage = show_storage();
    let first = serde_json::to_string_pretty(&classify_show(&storage).await).unwrap();
    let second = serde_json::to_string_pretty(&classify_show(&storage).await).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_non_matching_rule_permutation_is_stable() {
    let storage = show_storage();
    let report = scan(&storage).await;
    let metadata = StaticMetadata::new().with_series(1, "Show", &[2]);

    let miss_a = ClassifyRule {
        matcher: MatchRule {
            filename: Some("nothing-like-this".into()),
            ..MatchRule::default()
        },
        season: SeasonAssignment::Fixed(3),
        episode_offset: 0,
    };
    let miss_b = ClassifyRule {
        matcher: MatchRule {
            size_mb_greater: Some(10_000),
            ..MatchRule::default()
        },
        season: SeasonAssignment::Fixed(4),
        episode_offset: 0,
    };
    let hit = show_item().rules.remove(0);

    let orders = [
        vec![miss_a.clone(), miss_b.clone(), hit.clone()],
        vec![miss_b.clone(), hit.clone(), miss_a.clone()],
        vec![hit.clone(), miss_a.clone(), miss_b.clone()],
    ];
    let mut placements = Vec::new();
    for rules in orders {
        let mut item = show_item();
        item.rules = rules;
        let outcome = classifier::classify_with_provider(
            &report.files,
            &[item],
            &metadata,
            &ProgressBus::default(),
        )
        .await;
        let placed: Vec<(String, u32, u32)> = outcome.classifications[0]
            .files()
            .into_iter()
            .map(|f| (f.file.path.clone(), f.season, f.episode))
            .collect();
        placements.push(placed);
    }
    assert_eq!(placements[0], placements[1]);
    assert_eq!(placements[1], placements[2]);
}

#[tokio::test]
async fn test_organize_end_to_end() {
    let storage = show_storage();
    let outcome = classify_show(&storage).await;
    let plan = planner::plan(
        &outcome.classifications,
        &planner_config(PlanMode::Organize, "/Library"),
        &Locators::new(),
    );

    assert_eq!(plan.count(OperationKind::Move), 3);
    assert_eq!(plan.count(OperationKind::Copy), 1);
    assert!(plan.conflicts.is_empty());

    let executor = Executor::new(storage.clone());
    let mut ledger = HistoryLedger::in_memory();
    let report = executor.apply(&plan, &mut ledger, None).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(ledger.len(), 4);
    assert_eq!(
        storage.paths(),
        vec![
            "/Library/Show/Season 01/Show S01E01.chs.srt",
            "/Library/Show/Season 01/Show S01E01.mkv",
            "/Library/Show/Season 01/Show S01E01.srt",
            "/Library/Show/Season 01/Show S01E02.mkv",
        ]
    );
}

#[tokio::test]
async fn test_pointer_end_to_end() {
    let source = show_storage();
    let target = Arc::new(MemoryStorage::new());
    let outcome = classify_show(&source).await;

    let pointer = PointerConfig {
        base_url: Some("http://alist.local:5244".into()),
        flavor: LocatorFlavor::Alist,
    };
    let locators = planner::resolve_locators(&outcome.classifications, &pointer, source.as_ref()).await;
    let plan = planner::plan(
        &outcome.classifications,
        &planner_config(PlanMode::Pointer, "/strm"),
        &locators,
    );
    assert_eq!(plan.count(OperationKind::CreatePointer), 2);
    assert_eq!(plan.count(OperationKind::Move), 0);

    let executor = Executor::new(source.clone()).with_target(target.clone());
    let report = executor
        .apply(&plan, &mut HistoryLedger::in_memory(), None)
        .await
        .unwrap();
    assert!(report.is_complete());

    let content = target
        .get("/strm/Show/Season 01/Show S01E01.strm")
        .unwrap();
    assert_eq!(
        String::from_utf8(content).unwrap(),
        "http://alist.local:5244/d/Show/Show%20S01E01.mkv"
    );
    assert!(target.contains("/strm/Show/Season 01/Show S01E01.chs.srt"));
    // Source media is left in place.
    assert!(source.contains("/Show/Show S01E01.mkv"));
    assert!(source.operations().is_empty());
}

#[tokio::test]
async fn test_pointer_locators_from_storage_reference() {
    let source = show_storage();
    let outcome = classify_show(&source).await;
    let locators =
        planner::resolve_locators(&outcome.classifications, &PointerConfig::default(), source.as_ref())
            .await;
    assert_eq!(
        locators.get("/Show/Show S01E02.mkv").map(String::as_str),
        Some("memory:///Show/Show S01E02.mkv")
    );
}

#[test]
fn test_rules_file_round_trip_through_loader() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("rules.json");
    let rules = RuleSet {
        items: vec![show_item()],
    };
    std::fs::write(&path, serde_json::to_string_pretty(&rules).unwrap()).unwrap();
    assert_eq!(classifier::load_rules(&path).unwrap(), rules);
}

#[test]
fn test_planner_config_requires_target_root() {
    let mut config = Config::default();
    assert!(PlannerConfig::from_config(&config, PlanMode::Pointer).is_err());
    config.targets.pointer = Some("/strm/".into());
    let planner = PlannerConfig::from_config(&config, PlanMode::Pointer).unwrap();
    assert_eq!(planner.target_root, "/strm");
}
