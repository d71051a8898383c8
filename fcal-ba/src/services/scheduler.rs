//! Automation scheduler
//!
//! One service object owns the schedule registry, the single-flight pass
//! guard, the processed-file cache and the last/next-run bookkeeping. It is
//! constructed once at startup and started/stopped explicitly; the ticker
//! runs as one background task waking every 60 seconds.
//!
//! A pass that cannot acquire the guard is skipped, not queued: a tick
//! overlapping an in-flight pass does nothing and the next tick tries
//! again. Once a pass starts it runs to completion of its current file;
//! there is no mid-file cancellation.

use crate::config::QueueDirs;
use crate::models::{Destination, ProgressTracker, ScheduleSpec, TripParams};
use crate::services::batch_processor::BatchProcessor;
use crate::services::file_router;
use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use fcal_common::events::{AutomationEvent, EventBus};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Ticker wake cadence
const TICK_SECONDS: u64 = 60;

/// Bounded wait for the ticker task to exit on stop
const STOP_WAIT_SECONDS: u64 = 10;

/// Per-file summary returned from a pass
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub filename: String,
    pub processed_rows: usize,
    pub error_rows: usize,
    pub success_rate: f64,
    /// Terminal directory; None when the file failed at the whole-file level
    pub destination: Option<Destination>,
    /// Where the file ended up; None when the move failed or was not attempted
    pub moved_to: Option<String>,
    /// Whole-file error message, if any
    pub error: Option<String>,
}

/// Result of one pass invocation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    /// The pass ran (possibly over zero eligible files)
    Completed {
        pass_id: Uuid,
        files: Vec<FileSummary>,
    },
    /// Another pass held the guard; nothing was done
    Skipped,
}

/// Processed-file cache diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub cache_size: usize,
    pub processed_files: Vec<String>,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<String>,
}

struct TickerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Scheduler service owning the pass guard, cache and schedule registry
pub struct AutomationScheduler {
    processor: BatchProcessor,
    dirs: QueueDirs,
    event_bus: EventBus,
    pass_guard: Mutex<()>,
    processed_cache: Mutex<HashSet<String>>,
    specs: Mutex<Vec<ScheduleSpec>>,
    current_params: Mutex<Option<TripParams>>,
    last_run: Mutex<Option<DateTime<Utc>>>,
    ticker: Mutex<Option<TickerHandle>>,
}

impl AutomationScheduler {
    pub fn new(processor: BatchProcessor, dirs: QueueDirs, event_bus: EventBus) -> Self {
        Self {
            processor,
            dirs,
            event_bus,
            pass_guard: Mutex::new(()),
            processed_cache: Mutex::new(HashSet::new()),
            specs: Mutex::new(Vec::new()),
            current_params: Mutex::new(None),
            last_run: Mutex::new(None),
            ticker: Mutex::new(None),
        }
    }

    /// Queue directory layout this scheduler watches
    pub fn dirs(&self) -> &QueueDirs {
        &self.dirs
    }

    /// Progress tracker for the active pass
    pub fn tracker(&self) -> &ProgressTracker {
        self.processor.tracker()
    }

    /// Register a schedule spec with the ticker
    pub async fn register(&self, spec: ScheduleSpec) {
        info!(schedule = %spec.describe(), "Schedule registered");
        self.specs.lock().await.push(spec);
    }

    /// Set the trip parameters applied to subsequent passes
    pub async fn set_params(&self, params: TripParams) {
        *self.current_params.lock().await = Some(params.sanitized());
    }

    /// Parameters the next pass will use (last set, or the defaults)
    pub async fn active_params(&self) -> TripParams {
        let current = *self.current_params.lock().await;
        current.unwrap_or_default()
    }

    /// Process every eligible CSV file in the scheduled directory.
    ///
    /// Forced passes ignore the processed-file cache; unforced passes skip
    /// files already handled in this process's lifetime. At most one pass
    /// runs at a time; an overlapping invocation returns `Skipped`
    /// immediately. The guard is released on every exit path when the
    /// returned guard drops.
    pub async fn process_pending_files(&self, force: bool) -> PassOutcome {
        let _guard = match self.pass_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                info!("Processing already in progress, skipping");
                return PassOutcome::Skipped;
            }
        };

        let pass_id = Uuid::new_v4();

        let all_files = match file_router::pending_csv_files(&self.dirs.scheduled) {
            Ok(files) => files,
            Err(e) => {
                error!("Failed to list queue directory: {}", e);
                return PassOutcome::Completed {
                    pass_id,
                    files: Vec::new(),
                };
            }
        };

        let eligible: Vec<_> = if force {
            if !all_files.is_empty() {
                info!("Force processing all files (ignoring cache)");
            }
            all_files
        } else {
            let cache = self.processed_cache.lock().await;
            all_files
                .into_iter()
                .filter(|path| match path.file_name() {
                    Some(name) => !cache.contains(name.to_string_lossy().as_ref()),
                    None => false,
                })
                .collect()
        };

        if eligible.is_empty() {
            debug!("No new CSV files to process");
            return PassOutcome::Completed {
                pass_id,
                files: Vec::new(),
            };
        }

        info!(
            count = eligible.len(),
            forced = force,
            "Found CSV file(s) to process"
        );
        self.event_bus.emit_lossy(AutomationEvent::PassStarted {
            pass_id,
            forced: force,
            files: eligible.len(),
            timestamp: Utc::now(),
        });

        let params = self.active_params().await;
        let mut summaries = Vec::with_capacity(eligible.len());
        for path in &eligible {
            summaries.push(self.process_single_file(pass_id, path, &params).await);
        }

        *self.last_run.lock().await = Some(Utc::now());
        self.event_bus.emit_lossy(AutomationEvent::PassCompleted {
            pass_id,
            files_processed: summaries.len(),
            timestamp: Utc::now(),
        });

        PassOutcome::Completed {
            pass_id,
            files: summaries,
        }
    }

    /// Process one file, cache its name, and route it to its terminal
    /// directory with the result sidecar.
    async fn process_single_file(
        &self,
        pass_id: Uuid,
        path: &Path,
        params: &TripParams,
    ) -> FileSummary {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        info!(file = %filename, ?params, "Processing file");
        self.event_bus.emit_lossy(AutomationEvent::FileStarted {
            pass_id,
            filename: filename.clone(),
            timestamp: Utc::now(),
        });

        let result = self.processor.process_file(pass_id, path, params).await;

        // Cache regardless of outcome so a broken file is not retried on
        // every tick
        self.processed_cache.lock().await.insert(filename.clone());

        match result {
            Ok(report) => {
                match report.destination {
                    Destination::Errors if report.total_rows == 0 => {
                        warn!(file = %filename, "No rows processed, moving to errors")
                    }
                    Destination::Errors => warn!(
                        file = %filename,
                        processed = report.processed_rows,
                        errors = report.error_rows,
                        "Poor success rate, moving to errors"
                    ),
                    Destination::Processed if report.error_rows > 0 => info!(
                        file = %filename,
                        processed = report.processed_rows,
                        errors = report.error_rows,
                        "Partially processed, moving to processed"
                    ),
                    Destination::Processed => info!(
                        file = %filename,
                        processed = report.processed_rows,
                        "Successfully processed"
                    ),
                }

                let target_dir = match report.destination {
                    Destination::Processed => &self.dirs.processed,
                    Destination::Errors => &self.dirs.errors,
                };
                let new_name = file_router::timestamped_name(&Local::now(), &filename);

                // A failed move leaves the file in place; it must not be lost
                let moved_to = match file_router::safe_move(path, target_dir, &new_name) {
                    Ok(moved_path) => {
                        if let Err(e) = file_router::write_sidecar(target_dir, &new_name, &report)
                        {
                            error!(file = %filename, "Failed to write result sidecar: {}", e);
                        }
                        Some(moved_path.display().to_string())
                    }
                    Err(e) => {
                        error!(file = %filename, "Failed to move file: {}", e);
                        None
                    }
                };

                self.event_bus.emit_lossy(AutomationEvent::FileCompleted {
                    pass_id,
                    filename: filename.clone(),
                    destination: report.destination.as_str().to_string(),
                    processed_rows: report.processed_rows,
                    error_rows: report.error_rows,
                    success_rate: report.success_rate,
                    timestamp: Utc::now(),
                });

                FileSummary {
                    filename,
                    processed_rows: report.processed_rows,
                    error_rows: report.error_rows,
                    success_rate: report.success_rate,
                    destination: Some(report.destination),
                    moved_to,
                    error: None,
                }
            }
            Err(e) => {
                error!(file = %filename, "Failed to process file: {}", e);
                self.event_bus.emit_lossy(AutomationEvent::FileFailed {
                    pass_id,
                    filename: filename.clone(),
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });

                FileSummary {
                    filename,
                    processed_rows: 0,
                    error_rows: 0,
                    success_rate: 0.0,
                    destination: None,
                    moved_to: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Trigger an immediate forced pass.
    ///
    /// Uses the caller-supplied parameters when present, otherwise the
    /// last-set parameters or the defaults.
    pub async fn trigger_manual_run(&self, params: Option<TripParams>) -> PassOutcome {
        info!("Manual processing triggered (forced)");

        {
            let mut current = self.current_params.lock().await;
            match params {
                Some(p) => *current = Some(p.sanitized()),
                None => {
                    if current.is_none() {
                        *current = Some(TripParams::default());
                    }
                }
            }
        }

        self.process_pending_files(true).await
    }

    /// Clear the processed-file cache, returning the number of entries
    /// removed
    pub async fn clear_processed_cache(&self) -> usize {
        let mut cache = self.processed_cache.lock().await;
        let cleared = cache.len();
        cache.clear();
        info!("Cleared processed files cache ({} files)", cleared);
        cleared
    }

    /// Cache and schedule diagnostics
    pub async fn cache_info(&self) -> CacheInfo {
        let cache = self.processed_cache.lock().await;
        let mut processed_files: Vec<String> = cache.iter().cloned().collect();
        processed_files.sort();
        let cache_size = cache.len();
        drop(cache);

        let specs = self.specs.lock().await;
        let next_run = if specs.is_empty() {
            None
        } else {
            Some(
                specs
                    .iter()
                    .map(|s| s.describe())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };
        drop(specs);

        CacheInfo {
            cache_size,
            processed_files,
            last_run: *self.last_run.lock().await,
            next_run,
        }
    }

    /// Sweep the processed directory into a timestamped backup
    pub async fn backup_processed(&self) -> std::io::Result<(std::path::PathBuf, Vec<String>)> {
        file_router::backup_processed(&self.dirs, &Local::now())
    }

    /// Start the background ticker. No-op when already running.
    pub async fn start(self: &Arc<Self>) {
        let mut ticker = self.ticker.lock().await;
        if ticker.is_some() {
            warn!("Scheduler is already running");
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            scheduler.tick_loop(token).await;
        });

        *ticker = Some(TickerHandle { cancel, handle });
        info!("Scheduler started");
    }

    /// Stop the background ticker with a bounded wait.
    ///
    /// Best-effort: if the task does not exit within the wait the stop
    /// proceeds anyway.
    pub async fn stop(&self) {
        let ticker = self.ticker.lock().await.take();
        let Some(TickerHandle { cancel, handle }) = ticker else {
            return;
        };

        cancel.cancel();
        match tokio::time::timeout(Duration::from_secs(STOP_WAIT_SECONDS), handle).await {
            Ok(_) => info!("Scheduler stopped"),
            Err(_) => warn!(
                "Scheduler tick task did not exit within {}s, continuing",
                STOP_WAIT_SECONDS
            ),
        }
    }

    /// True while the ticker task is running
    pub async fn is_running(&self) -> bool {
        self.ticker.lock().await.is_some()
    }

    async fn tick_loop(self: Arc<Self>, cancel: CancellationToken) {
        info!("Scheduler tick task started ({}s interval)", TICK_SECONDS);
        let mut interval = tokio::time::interval(Duration::from_secs(TICK_SECONDS));
        // A spec fires at most once per scheduled minute
        let mut last_fired: Option<(u32, u32, u32)> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Scheduler tick task stopping");
                    break;
                }
                _ = interval.tick() => {
                    let now = Local::now();
                    let due = {
                        let specs = self.specs.lock().await;
                        specs.iter().any(|spec| spec.is_due(&now))
                    };
                    if !due {
                        continue;
                    }

                    let minute_key = (now.ordinal(), now.hour(), now.minute());
                    if last_fired == Some(minute_key) {
                        continue;
                    }
                    last_fired = Some(minute_key);

                    debug!("Schedule due, starting unforced pass");
                    if let PassOutcome::Skipped = self.process_pending_files(false).await {
                        debug!("Scheduled pass skipped (already running)");
                    }
                }
            }
        }
    }
}
