//! ShardWorker tests: failure isolation, failure logs, progress.

mod common;

use std::{
    fs,
    sync::{Arc, Mutex},
};

use common::{MockExtractor, MockFetcher, collaborators, png_names};
use framegrab::{
    FramegrabError, OperationType, ProgressCallback, ProgressInfo, RunConfig, Sequence,
    ShardWorker, SourceGroup,
};

fn source(locator: &str, names: &[&str]) -> SourceGroup {
    SourceGroup {
        source_identifier: locator.to_string(),
        sequences: names
            .iter()
            .map(|name| Sequence {
                name: name.to_string(),
                timestamps: vec![1000, 2000],
            })
            .collect(),
    }
}

fn shard() -> Vec<SourceGroup> {
    vec![
        source("https://v/first", &["s1"]),
        source("https://v/gone", &["s2", "s3"]),
        source("https://v/last", &["s4"]),
    ]
}

#[test]
fn download_failure_does_not_stop_the_shard() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let logs = temporary_directory.path().join("logs");
    let config = RunConfig::new(temporary_directory.path().join("videos"), "train")
        .with_failure_log_dir(&logs);
    let fetcher = MockFetcher::failing_for(&["https://v/gone"]);
    let extractor = MockExtractor::default();
    let collaborators = collaborators(&fetcher, &extractor);
    let worker = ShardWorker::new(&collaborators, &config, 5).expect("Failed to build worker");

    let report = worker.run(&shard()).expect("Shard should finish");

    assert_eq!(report.worker_id, 5);
    assert_eq!(report.completed_groups, 2);
    assert_eq!(report.failed_sources, ["https://v/gone"]);
    assert_eq!(report.failed_sequences, ["s2", "s3"]);
    assert_eq!(report.frames.extracted, 4);
    assert_eq!(
        fetcher.locators(),
        ["https://v/first", "https://v/gone", "https://v/last"]
    );

    assert_eq!(png_names(&config.sequence_dir("s4")), ["1000.png", "2000.png"]);
    assert!(!config.sequence_dir("s2").exists());

    let log_path = logs.join("failed_videos_train_5.txt");
    assert_eq!(config.failure_log_path(5), log_path);
    let contents = fs::read_to_string(&log_path).expect("Failure log should exist");
    assert_eq!(contents, "s2\ns3\n");
}

#[test]
fn failure_log_is_appended_across_runs() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = RunConfig::new(temporary_directory.path(), "test")
        .with_failure_log_dir(temporary_directory.path());
    let fetcher = MockFetcher::failing_for(&["https://v/gone"]);
    let extractor = MockExtractor::default();
    let collaborators = collaborators(&fetcher, &extractor);
    let worker = ShardWorker::new(&collaborators, &config, 0).expect("Failed to build worker");

    let failing = vec![source("https://v/gone", &["s2"])];
    worker.run(&failing).expect("First run should finish");
    worker.run(&failing).expect("Second run should finish");

    let contents = fs::read_to_string(config.failure_log_path(0)).expect("Failure log should exist");
    assert_eq!(contents, "s2\ns2\n");
}

#[test]
fn no_failure_log_when_everything_downloads() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = RunConfig::new(temporary_directory.path(), "train")
        .with_failure_log_dir(temporary_directory.path());
    let fetcher = MockFetcher::default();
    let extractor = MockExtractor::default();
    let collaborators = collaborators(&fetcher, &extractor);
    let worker = ShardWorker::new(&collaborators, &config, 1).expect("Failed to build worker");

    let report = worker.run(&shard()).expect("Shard should finish");

    assert_eq!(report.completed_groups, 3);
    assert!(report.failed_sequences.is_empty());
    assert!(!config.failure_log_path(1).exists());
}

#[test]
fn extraction_failure_stops_the_shard() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = RunConfig::new(temporary_directory.path(), "train")
        .with_failure_log_dir(temporary_directory.path());
    let fetcher = MockFetcher::default();
    let extractor = MockExtractor::new(&[], &["1000"]);
    let collaborators = collaborators(&fetcher, &extractor);
    let worker = ShardWorker::new(&collaborators, &config, 0).expect("Failed to build worker");

    let error = worker.run(&shard()).expect_err("Extraction error should stop the shard");

    assert!(matches!(error, FramegrabError::Extraction { .. }));
    assert_eq!(fetcher.locators(), ["https://v/first"]);
    assert!(!config.failure_log_path(0).exists());
}

#[test]
fn empty_shard_finishes_immediately() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let config = RunConfig::new(temporary_directory.path(), "train");
    let fetcher = MockFetcher::default();
    let extractor = MockExtractor::default();
    let collaborators = collaborators(&fetcher, &extractor);
    let worker = ShardWorker::new(&collaborators, &config, 7).expect("Failed to build worker");

    let report = worker.run(&[]).expect("Empty shard should finish");

    assert_eq!(report.completed_groups, 0);
    assert!(fetcher.locators().is_empty());
}

// ── Progress ─────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingProgress(Mutex<Vec<ProgressInfo>>);

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.0.lock().unwrap().push(info.clone());
    }
}

#[test]
fn progress_reports_each_group_twice() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let progress = Arc::new(RecordingProgress::default());
    let config = RunConfig::new(temporary_directory.path(), "train")
        .with_failure_log_dir(temporary_directory.path())
        .with_progress(progress.clone());
    let fetcher = MockFetcher::failing_for(&["https://v/gone"]);
    let extractor = MockExtractor::default();
    let collaborators = collaborators(&fetcher, &extractor);
    let worker = ShardWorker::new(&collaborators, &config, 2).expect("Failed to build worker");

    worker.run(&shard()).expect("Shard should finish");

    let infos = progress.0.lock().unwrap();
    assert_eq!(infos.len(), 6);
    assert!(infos.iter().all(|info| info.worker_id == 2 && info.total == 3));
    assert_eq!(infos[0].operation, OperationType::Download);
    assert_eq!(infos[3].operation, OperationType::FrameExtraction);
    assert_eq!(infos[3].current, 2);
    assert_eq!(infos[3].source.as_deref(), Some("https://v/gone"));
    assert_eq!(infos[5].percentage, Some(100.0));
}
