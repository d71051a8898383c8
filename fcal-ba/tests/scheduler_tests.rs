//! Scheduler integration tests
//!
//! Cover pass orchestration: file routing with sidecars, cache-driven
//! idempotence, forced reprocessing, the single-flight guard and the
//! ticker lifecycle.

mod helpers;

use fcal_ba::models::{Destination, ScheduleSpec, TripParams};
use fcal_ba::services::PassOutcome;
use helpers::{csv_names, harness, ScriptedOracle};
use std::time::Duration;

fn completed_files(outcome: &PassOutcome) -> &[fcal_ba::services::FileSummary] {
    match outcome {
        PassOutcome::Completed { files, .. } => files,
        PassOutcome::Skipped => panic!("expected a completed pass"),
    }
}

/// An unforced pass moves the file out of the pending directory into
/// processed under a timestamped name, with the result sidecar alongside.
#[tokio::test]
async fn pass_routes_file_and_writes_sidecar() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::succeeding());
    h.queue_file("routes.csv", "from,to\nJFK,LAX\nLHR,CDG\n");

    let outcome = scheduler.process_pending_files(false).await;
    let files = completed_files(&outcome);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].destination, Some(Destination::Processed));
    assert!(files[0].moved_to.is_some());

    // Pending directory no longer holds the file
    assert!(csv_names(&h.dirs.scheduled).is_empty());

    // Moved file keeps its original name under a timestamp prefix
    let processed = csv_names(&h.dirs.processed);
    assert_eq!(processed.len(), 1);
    assert!(processed[0].ends_with("_routes.csv"));

    // Sidecar parses back into a batch report
    let sidecar_path = h
        .dirs
        .processed
        .join(format!("{}.result.json", processed[0]));
    assert!(sidecar_path.exists());
    let report: fcal_ba::models::BatchReport =
        serde_json::from_str(&std::fs::read_to_string(&sidecar_path).unwrap()).unwrap();
    assert_eq!(report.original_filename, "routes.csv");
    assert_eq!(report.processed_rows, 2);
    assert_eq!(report.results.len(), 2);
}

/// A file whose rows mostly fail routes to the errors directory.
#[tokio::test]
async fn failing_file_routes_to_errors_directory() {
    let h = harness().await;
    let oracle = ScriptedOracle::failing_for(&[("JFK", "LAX"), ("LHR", "CDG")]);
    let scheduler = h.scheduler(oracle);
    h.queue_file("bad.csv", "from,to\nJFK,LAX\nLHR,CDG\nAMS,FRA\n");

    let outcome = scheduler.process_pending_files(false).await;
    let files = completed_files(&outcome);
    assert_eq!(files[0].destination, Some(Destination::Errors));

    assert!(csv_names(&h.dirs.scheduled).is_empty());
    assert_eq!(csv_names(&h.dirs.errors).len(), 1);
}

/// Unforced passes skip cached filenames; a forced pass reprocesses them.
#[tokio::test]
async fn cache_makes_unforced_passes_idempotent() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::succeeding());
    h.queue_file("daily.csv", "from,to\nJFK,LAX\n");

    let first = scheduler.process_pending_files(false).await;
    assert_eq!(completed_files(&first).len(), 1);

    // Same filename re-uploaded; cache blocks the unforced pass
    h.queue_file("daily.csv", "from,to\nJFK,LAX\n");
    let second = scheduler.process_pending_files(false).await;
    assert!(completed_files(&second).is_empty());
    assert_eq!(csv_names(&h.dirs.scheduled), vec!["daily.csv"]);

    // Forced run bypasses the cache and moves it
    let forced = scheduler.trigger_manual_run(None).await;
    assert_eq!(completed_files(&forced).len(), 1);
    assert!(csv_names(&h.dirs.scheduled).is_empty());
    assert_eq!(csv_names(&h.dirs.processed).len(), 2);
}

/// Clearing the cache reports how many entries were dropped and re-enables
/// unforced processing.
#[tokio::test]
async fn clear_cache_returns_count() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::succeeding());
    h.queue_file("one.csv", "from,to\nJFK,LAX\n");
    h.queue_file("two.csv", "from,to\nLHR,CDG\n");

    scheduler.process_pending_files(false).await;
    assert_eq!(scheduler.clear_processed_cache().await, 2);
    assert_eq!(scheduler.clear_processed_cache().await, 0);
}

/// Two simultaneous trigger attempts: exactly one runs, the other is
/// skipped without error.
#[tokio::test]
async fn concurrent_passes_single_flight() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::slow(Duration::from_millis(200)));
    h.queue_file("slow.csv", "from,to\nJFK,LAX\n");

    let (a, b) = tokio::join!(
        scheduler.trigger_manual_run(None),
        scheduler.trigger_manual_run(None),
    );

    let skipped = [&a, &b]
        .iter()
        .filter(|o| matches!(o, PassOutcome::Skipped))
        .count();
    assert_eq!(skipped, 1, "exactly one pass must be skipped");

    // The winning pass still moved the file
    assert!(csv_names(&h.dirs.scheduled).is_empty());
}

/// A whole-file failure leaves the file in place but caches the name so
/// unforced passes stop retrying it.
#[tokio::test]
async fn whole_file_failure_leaves_file_and_caches_name() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::succeeding());
    h.queue_file("broken.csv", "");

    let outcome = scheduler.process_pending_files(false).await;
    let files = completed_files(&outcome);
    assert_eq!(files.len(), 1);
    assert!(files[0].error.is_some());
    assert!(files[0].destination.is_none());
    assert!(files[0].moved_to.is_none());

    // Still pending on disk, but not retried unforced
    assert_eq!(csv_names(&h.dirs.scheduled), vec!["broken.csv"]);
    let retry = scheduler.process_pending_files(false).await;
    assert!(completed_files(&retry).is_empty());
}

/// Manual triggers apply the caller's parameters; later passes keep them.
#[tokio::test]
async fn manual_params_become_active_params() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::succeeding());

    assert_eq!(scheduler.active_params().await, TripParams::default());

    let params = TripParams {
        passengers: 4,
        cabin_class: fcal_ba::models::CabinClass::First,
        round_trip: true,
    };
    scheduler.trigger_manual_run(Some(params)).await;
    assert_eq!(scheduler.active_params().await, params);
}

/// Cache info reflects registered schedules and processed filenames.
#[tokio::test]
async fn cache_info_reports_schedule_and_files() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::succeeding());
    scheduler
        .register(ScheduleSpec::Daily { hour: 2, minute: 0 })
        .await;
    h.queue_file("seen.csv", "from,to\nJFK,LAX\n");
    scheduler.process_pending_files(false).await;

    let info = scheduler.cache_info().await;
    assert_eq!(info.cache_size, 1);
    assert_eq!(info.processed_files, vec!["seen.csv"]);
    assert!(info.last_run.is_some());
    assert_eq!(info.next_run.as_deref(), Some("Daily at 02:00"));
}

/// Backup sweep moves processed CSVs into a timestamped sibling directory.
#[tokio::test]
async fn backup_sweeps_processed_directory() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::succeeding());
    h.queue_file("done.csv", "from,to\nJFK,LAX\n");
    scheduler.process_pending_files(false).await;
    assert_eq!(csv_names(&h.dirs.processed).len(), 1);

    let (backup_dir, moved) = scheduler.backup_processed().await.unwrap();
    assert_eq!(moved.len(), 1);
    assert!(backup_dir.exists());
    assert!(csv_names(&h.dirs.processed).is_empty());
}

/// Ticker lifecycle: start is idempotent-ish (warns), stop joins the task.
#[tokio::test]
async fn ticker_starts_and_stops() {
    let h = harness().await;
    let scheduler = h.scheduler(ScriptedOracle::succeeding());

    assert!(!scheduler.is_running().await);
    scheduler.start().await;
    assert!(scheduler.is_running().await);
    // Second start is a no-op
    scheduler.start().await;

    scheduler.stop().await;
    assert!(!scheduler.is_running().await);
    // Stopping again is harmless
    scheduler.stop().await;
}
