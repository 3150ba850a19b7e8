//! Integration tests for the scan → analyze → join → table pipeline.

use async_trait::async_trait;
use clipset::{
    generate, AnalysisError, Analyzer, DatasetScanner, DirectoryError, GenerateError,
    GenerateOptions, ScanConfig, Scheduler, SchedulerConfig,
};
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Serialize)]
struct Echo {
    /// "<label>/<file>" as seen by the analyzer
    source: String,
    rate: u32,
}

/// Analyzer that sleeps a random time, tracks overlap, and fails on demand.
#[derive(Default)]
struct Instrumented {
    fail: HashSet<String>,
    max_delay_ms: u64,
    calls: AtomicUsize,
    finished: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Instrumented {
    fn with_delay(max_delay_ms: u64) -> Self {
        Self {
            max_delay_ms,
            ..Self::default()
        }
    }

    fn failing(mut self, source: &str) -> Self {
        self.fail.insert(source.to_string());
        self
    }
}

fn source_of(path: &Path) -> String {
    let label = path
        .parent()
        .and_then(|p| p.file_name())
        .unwrap()
        .to_string_lossy();
    let file = path.file_name().unwrap().to_string_lossy();
    format!("{}/{}", label, file)
}

#[async_trait]
impl Analyzer for Instrumented {
    type Output = Echo;

    async fn analyze(&self, path: &Path, sampling_rate: u32) -> Result<Echo, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.max_delay_ms > 0 {
            let delay = rand::thread_rng().gen_range(0..=self.max_delay_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);

        let source = source_of(path);
        if self.fail.contains(&source) {
            return Err(AnalysisError::Failed(format!("cannot decode {}", source)));
        }

        Ok(Echo {
            source,
            rate: sampling_rate,
        })
    }

    fn name(&self) -> &str {
        "instrumented"
    }
}

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"clip").unwrap();
}

/// cat/{a.mp4, b.mp4}, dog/{c.mp4}, .hidden/{x.mp4}, cat/readme.txt
fn sample_dataset() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "cat/a.mp4");
    touch(root, "cat/b.mp4");
    touch(root, "dog/c.mp4");
    touch(root, ".hidden/x.mp4");
    touch(root, "cat/readme.txt");
    temp_dir
}

/// `labels` label directories with `per_label(i)` clips each.
fn wide_dataset(labels: usize, per_label: impl Fn(usize) -> usize) -> (TempDir, usize) {
    let temp_dir = TempDir::new().unwrap();
    let mut total = 0;
    for l in 0..labels {
        for f in 0..per_label(l) {
            touch(temp_dir.path(), &format!("label{:02}/clip{:03}.mp4", l, f));
            total += 1;
        }
    }
    (temp_dir, total)
}

fn column_strings(table: &clipset::Table, name: &str) -> Vec<String> {
    table
        .column(name)
        .unwrap()
        .into_iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_sample_dataset_builds_three_rows() {
    let temp_dir = sample_dataset();
    let analyzer = Arc::new(Instrumented::default());

    let generated = generate(
        GenerateOptions::new(temp_dir.path()).sampling_rate(12),
        analyzer.clone(),
    )
    .await
    .unwrap();

    let table = &generated.table;
    assert_eq!(table.columns, vec!["label", "filename", "rate", "source"]);
    assert_eq!(column_strings(table, "label"), vec!["cat", "cat", "dog"]);
    assert_eq!(
        column_strings(table, "filename"),
        vec!["a.mp4", "b.mp4", "c.mp4"]
    );
    assert_eq!(table.rows[0][2], json!(12));

    assert!(generated.failures.is_empty());
    assert_eq!(generated.skipped.len(), 1);
    assert!(generated.skipped[0].path.ends_with("readme.txt"));
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_single_failure_is_reported_not_tabled() {
    let temp_dir = sample_dataset();
    let analyzer = Arc::new(Instrumented::default().failing("dog/c.mp4"));

    let generated = generate(GenerateOptions::new(temp_dir.path()), analyzer)
        .await
        .unwrap();

    assert_eq!(generated.table.len(), 2);
    assert_eq!(column_strings(&generated.table, "label"), vec!["cat", "cat"]);

    assert_eq!(generated.failures.len(), 1);
    let failure = &generated.failures[0];
    assert_eq!(failure.label, "dog");
    assert_eq!(failure.file_name, "c.mp4");
    assert_eq!(failure.sequence_index, 2);
    assert_eq!(generated.summary.items_failed, 1);
}

#[tokio::test]
async fn test_unlistable_root_schedules_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let analyzer = Arc::new(Instrumented::default());

    let result = generate(
        GenerateOptions::new(temp_dir.path().join("does-not-exist")),
        analyzer.clone(),
    )
    .await;

    assert!(matches!(
        result,
        Err(GenerateError::Directory(DirectoryError::InvalidRoot { .. }))
    ));
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_zero_sampling_rate_schedules_nothing() {
    let temp_dir = sample_dataset();
    let analyzer = Arc::new(Instrumented::default());

    let result = generate(
        GenerateOptions::new(temp_dir.path()).sampling_rate(0),
        analyzer.clone(),
    )
    .await;

    assert!(matches!(result, Err(GenerateError::InvalidOptions(_))));
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_dangling_links_do_not_stop_the_run() {
    let temp_dir = sample_dataset();
    let root = temp_dir.path();
    std::os::unix::fs::symlink(root.join("gone"), root.join("stale_link")).unwrap();
    std::os::unix::fs::symlink(root.join("dog/nowhere.mp4"), root.join("dog/broken.mp4"))
        .unwrap();

    let generated = generate(
        GenerateOptions::new(root),
        Arc::new(Instrumented::default()),
    )
    .await
    .unwrap();

    assert_eq!(
        column_strings(&generated.table, "filename"),
        vec!["a.mp4", "b.mp4", "c.mp4"]
    );
    assert!(generated.failures.is_empty());
}

#[tokio::test]
async fn test_empty_root_yields_empty_table() {
    let temp_dir = TempDir::new().unwrap();

    let generated = tokio::time::timeout(
        Duration::from_secs(5),
        generate(
            GenerateOptions::new(temp_dir.path()),
            Arc::new(Instrumented::default()),
        ),
    )
    .await
    .expect("empty dataset must not hang")
    .unwrap();

    assert!(generated.table.is_empty());
    assert!(generated.failures.is_empty());
    assert_eq!(generated.summary.items_discovered, 0);
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_row_count_matches_accepted_files() {
    let (temp_dir, total) = wide_dataset(5, |l| l * 3 + 1);
    touch(temp_dir.path(), "label00/notes.txt");

    let generated = generate(
        GenerateOptions::new(temp_dir.path()).concurrency(4),
        Arc::new(Instrumented::with_delay(5)),
    )
    .await
    .unwrap();

    assert_eq!(total, 1 + 4 + 7 + 10 + 13);
    assert_eq!(generated.table.len(), total);
    assert_eq!(generated.summary.label_counts["label04"], 13);
    assert_eq!(generated.skipped.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_in_flight_never_exceeds_limit() {
    let (temp_dir, total) = wide_dataset(4, |_| 10);

    for limit in [1, 3, 5] {
        let analyzer = Arc::new(Instrumented::with_delay(8));
        let generated = generate(
            GenerateOptions::new(temp_dir.path()).concurrency(limit),
            analyzer.clone(),
        )
        .await
        .unwrap();

        assert_eq!(generated.table.len(), total);
        let peak = analyzer.max_in_flight.load(Ordering::SeqCst);
        assert!(peak <= limit, "peak {} exceeded limit {}", peak, limit);
        assert!(peak >= 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_barrier_waits_for_every_task() {
    let (temp_dir, total) = wide_dataset(3, |_| 8);
    let dataset = DatasetScanner::new(temp_dir.path(), ScanConfig::default())
        .scan()
        .unwrap();
    let analyzer = Arc::new(Instrumented::with_delay(20));
    let scheduler = Scheduler::new(SchedulerConfig {
        concurrency: 4,
        ..SchedulerConfig::default()
    })
    .unwrap();

    let result_set = scheduler.run(&dataset, analyzer.clone(), 30).await.unwrap();

    // Nothing may still be running once the result set is handed back.
    assert_eq!(analyzer.finished.load(Ordering::SeqCst), total);
    assert_eq!(analyzer.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(result_set.written(), total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_rows_match_their_source_under_random_completion() {
    let (temp_dir, total) = wide_dataset(6, |l| 4 + l);
    let failing = format!("label03/clip{:03}.mp4", 2);

    for _ in 0..5 {
        let analyzer = Arc::new(Instrumented::with_delay(15).failing(&failing));
        let generated = generate(
            GenerateOptions::new(temp_dir.path()).concurrency(6),
            analyzer,
        )
        .await
        .unwrap();

        let table = &generated.table;
        assert_eq!(table.len(), total - 1);

        for record in table.records() {
            let expected = format!(
                "{}/{}",
                record["label"].as_str().unwrap(),
                record["filename"].as_str().unwrap()
            );
            assert_eq!(record["source"].as_str().unwrap(), expected);
        }

        assert_eq!(generated.failures.len(), 1);
        assert_eq!(
            format!(
                "{}/{}",
                generated.failures[0].label, generated.failures[0].file_name
            ),
            failing
        );
    }
}

#[tokio::test]
async fn test_unsupported_files_do_not_stop_the_run() {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "cat/a.mp4");
    touch(temp_dir.path(), "cat/b.avi");
    touch(temp_dir.path(), "cat/c");
    touch(temp_dir.path(), "dog/d.mp4");

    let generated = generate(
        GenerateOptions::new(temp_dir.path()),
        Arc::new(Instrumented::default()),
    )
    .await
    .unwrap();

    assert_eq!(column_strings(&generated.table, "filename"), vec!["a.mp4", "d.mp4"]);
    let skipped: Vec<_> = generated
        .skipped
        .iter()
        .map(|s| s.extension.as_str())
        .collect();
    assert_eq!(skipped, vec!["avi", ""]);
}

#[tokio::test]
async fn test_analysis_timeout_is_recorded_as_failure() {
    struct Stuck;

    #[async_trait]
    impl Analyzer for Stuck {
        type Output = Echo;

        async fn analyze(&self, path: &Path, rate: u32) -> Result<Echo, AnalysisError> {
            if path.ends_with("slow.mp4") {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(Echo {
                source: source_of(path),
                rate,
            })
        }
    }

    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "cat/fast.mp4");
    touch(temp_dir.path(), "cat/slow.mp4");

    let mut options = GenerateOptions::new(temp_dir.path());
    options.analysis_timeout = Some(Duration::from_millis(50));

    let generated = generate(options, Arc::new(Stuck)).await.unwrap();

    assert_eq!(generated.table.len(), 1);
    assert_eq!(generated.failures.len(), 1);
    assert_eq!(generated.failures[0].file_name, "slow.mp4");
    assert!(generated.failures[0].error.contains("timed out"));
}

#[test]
fn test_barrier_wakes_waiter_on_last_arrival() {
    let barrier = clipset::JoinBarrier::new(2);
    let mut wait = tokio_test::task::spawn(barrier.wait());

    tokio_test::assert_pending!(wait.poll());
    barrier.arrive();
    tokio_test::assert_pending!(wait.poll());

    barrier.arrive();
    assert!(wait.is_woken());
    tokio_test::assert_ready!(wait.poll());
}

#[tokio::test]
async fn test_spawned_generate_delivers_one_result() {
    let temp_dir = sample_dataset();
    let rx = clipset::spawn_generate(
        GenerateOptions::new(temp_dir.path()),
        Arc::new(Instrumented::with_delay(5)),
    );

    let generated = tokio_test::assert_ok!(clipset::pipeline::receive(rx).await);
    assert_eq!(generated.table.len(), 3);
}
