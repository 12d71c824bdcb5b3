//! Integration tests for the storage scanner.
//!
//! Real directories via tempfile, read through `LocalStorage`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use strm_organizer::core::progress::ProgressBus;
use strm_organizer::core::scanner::{Scanner, ScannerConfig};
use strm_organizer::models::progress::{Stage, StageEvent, StageStatus};
use strm_organizer::services::local::LocalStorage;
use strm_organizer::services::memory::MemoryStorage;
use tempfile::TempDir;

fn touch(root: &Path, relative: &str, size: usize) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; size]).unwrap();
}

fn scanner(root: &Path) -> Scanner {
    Scanner::new(Arc::new(LocalStorage::new(root)))
}

fn drain(receiver: &mut tokio::sync::broadcast::Receiver<StageEvent>) -> Vec<StageEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_scan_empty_directory() {
    let temp = TempDir::new().unwrap();
    let report = scanner(temp.path()).scan("/").await.unwrap();
    assert!(report.files.is_empty());
    assert!(report.errors.is_empty());
    assert_eq!(report.directories, 1);
}

#[tokio::test]
async fn test_scan_videos_and_subtitles() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "Show/Show S01E01.mkv", 10);
    touch(temp.path(), "Show/Show S01E02.mkv", 10);
    touch(temp.path(), "Show/Show.S01E01.chs.srt", 1);
    touch(temp.path(), "Show/notes.txt", 1);

    let report = scanner(temp.path()).scan("/").await.unwrap();

    assert_eq!(report.video_count(), 2);
    assert_eq!(report.subtitle_count(), 1);
    let first = report
        .videos()
        .find(|f| f.name == "Show S01E01.mkv")
        .unwrap();
    assert_eq!(first.raw_episode, Some(1));
    assert_eq!(first.size, 10);
    assert_eq!(first.directory, "/Show");

    let subtitles = report.subtitles_for("/Show/Show S01E01.mkv");
    assert_eq!(subtitles.len(), 1);
    assert_eq!(subtitles[0].language.as_deref(), Some("chs"));
}

#[tokio::test]
async fn test_scan_skips_samples_and_excluded() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "Movie/Movie.2020.mkv", 10);
    touch(temp.path(), "Movie/sample.mkv", 1);
    touch(temp.path(), "@eaDir/thumb.mp4", 1);

    let report = scanner(temp.path()).scan("/").await.unwrap();

    let names: Vec<&str> = report.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Movie.2020.mkv"]);
}

#[tokio::test]
async fn test_scan_nonexistent_path_is_collected() {
    let temp = TempDir::new().unwrap();
    let report = scanner(temp.path()).scan("/missing").await.unwrap();
    assert!(report.files.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].directory, "/missing");
}

#[tokio::test]
async fn test_scan_respects_depth_and_recursion() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "top.mkv", 1);
    touch(temp.path(), "a/b/c/deep.mkv", 1);

    let shallow = ScannerConfig {
        max_depth: 1,
        ..ScannerConfig::default()
    };
    let storage = Arc::new(LocalStorage::new(temp.path()));
    let report = Scanner::with_config(storage.clone(), shallow)
        .scan("/")
        .await
        .unwrap();
    assert_eq!(report.video_count(), 1);

    let flat = ScannerConfig {
        recursive: false,
        ..ScannerConfig::default()
    };
    let report = Scanner::with_config(storage, flat).scan("/").await.unwrap();
    assert_eq!(report.directories, 1);
    assert_eq!(report.video_count(), 1);
}

#[tokio::test]
async fn test_scan_file_limit_truncates() {
    let temp = TempDir::new().unwrap();
    for n in 1..=5 {
        touch(temp.path(), &format!("Show/E{:02}.mkv", n), 1);
    }
    let config = ScannerConfig {
        max_files: 3,
        ..ScannerConfig::default()
    };
    let report = Scanner::with_config(Arc::new(LocalStorage::new(temp.path())), config)
        .scan("/")
        .await
        .unwrap();
    assert!(report.truncated);
    assert_eq!(report.files.len(), 3);
}

#[tokio::test]
async fn test_counters_match_report() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), "a/1.mkv", 1);
    touch(temp.path(), "b/2.mp4", 1);
    touch(temp.path(), "b/2.ass", 1);

    let scanner = scanner(temp.path());
    let counters = scanner.counters();
    let report = scanner.scan("/").await.unwrap();

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.videos, report.video_count());
    assert_eq!(snapshot.subtitles, report.subtitle_count());
    assert_eq!(snapshot.directories, 3);
}

#[tokio::test]
async fn test_scan_publishes_progress_snapshots() {
    let storage = MemoryStorage::new();
    for i in 1..=6 {
        storage.add_file(&format!("/d{}/Show S01E0{}.mkv", i, i), 1);
    }
    storage.add_file("/d1/Show S01E01.srt", 1);

    let bus = ProgressBus::default();
    let mut receiver = bus.subscribe();
    let report = Scanner::new(Arc::new(storage))
        .with_progress(bus.clone())
        .scan("/")
        .await
        .unwrap();
    assert_eq!(report.directories, 7);

    let events = drain(&mut receiver);
    assert!(events.iter().all(|e| e.stage == Stage::Scan));
    assert_eq!(events[0].status, StageStatus::Executing);
    assert_eq!(events[0].message, "Scanning /");

    // Root plus d1..d4 makes the fifth directory.
    let snapshot = events
        .iter()
        .find(|e| e.status == StageStatus::Executing && e.current == 5)
        .expect("snapshot after five directories");
    assert_eq!(snapshot.message, "5 directories, 4 videos, 1 subtitles");

    let last = events.last().unwrap();
    assert_eq!(last.status, StageStatus::Complete);
    assert_eq!(last.total, 7);
    assert_eq!(last.message, "6 videos, 1 subtitles");
}

#[tokio::test]
async fn test_scan_waits_between_listings() {
    let storage = MemoryStorage::new();
    storage.add_file("/a/Show S01E01.mkv", 1);
    storage.add_file("/b/Show S01E02.mkv", 1);

    let config = ScannerConfig {
        delay: Duration::from_millis(40),
        ..ScannerConfig::default()
    };
    let started = tokio::time::Instant::now();
    let report = Scanner::with_config(Arc::new(storage), config)
        .scan("/")
        .await
        .unwrap();

    // Three listings, a delay before each after the first.
    assert_eq!(report.directories, 3);
    assert!(started.elapsed() >= Duration::from_millis(80));
}

#[tokio::test]
async fn test_unreadable_directory_mid_tree_is_skipped() {
    let storage = MemoryStorage::new();
    storage.add_file("/a/Show S01E01.mkv", 1);
    storage.add_file("/b/Show S01E02.mkv", 1);
    storage.add_file("/b/deeper/Show S01E03.mkv", 1);
    storage.add_file("/c/Show S01E04.mkv", 1);
    storage.fail_on("/b");

    let bus = ProgressBus::default();
    let mut receiver = bus.subscribe();
    let report = Scanner::new(Arc::new(storage))
        .with_progress(bus.clone())
        .scan("/")
        .await
        .unwrap();

    let paths: Vec<&str> = report.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["/a/Show S01E01.mkv", "/c/Show S01E04.mkv"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].directory, "/b");
    assert_eq!(report.directories, 3);

    // A skipped subdirectory does not fail the stage.
    let last = drain(&mut receiver).pop().unwrap();
    assert_eq!(last.status, StageStatus::Complete);
}

#[tokio::test]
async fn test_unreadable_root_publishes_error() {
    let storage = MemoryStorage::new();
    storage.add_file("/media/Show S01E01.mkv", 1);
    storage.fail_on("/media");

    let bus = ProgressBus::default();
    let mut receiver = bus.subscribe();
    let report = Scanner::new(Arc::new(storage))
        .with_progress(bus.clone())
        .scan("/media")
        .await
        .unwrap();

    assert!(report.files.is_empty());
    assert_eq!(report.errors.len(), 1);

    let last = drain(&mut receiver).pop().unwrap();
    assert_eq!(last.stage, Stage::Scan);
    assert_eq!(last.status, StageStatus::Error);
    assert!(last.message.starts_with("Cannot read /media"));
}
