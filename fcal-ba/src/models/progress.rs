//! Shared progress state for the active processing pass
//!
//! One snapshot instance exists per process. The active pass is the only
//! writer; any number of observers read it through the progress endpoint.
//! The dynamic dict of the original implementation is replaced by a fixed
//! struct with typed mutation methods, so a mistyped field cannot be
//! silently dropped.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Pass status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Idle,
    Processing,
    Completed,
    Failed,
}

/// Snapshot of the current pass, returned verbatim to observers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: ProgressStatus,
    pub message: String,
    pub current_row: usize,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub error_rows: usize,
    pub progress_percent: f64,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            status: ProgressStatus::Idle,
            message: "Ready for processing".to_string(),
            current_row: 0,
            total_rows: 0,
            processed_rows: 0,
            error_rows: 0,
            progress_percent: 0.0,
        }
    }
}

/// Cloneable handle to the process-wide progress snapshot
///
/// Writes go through the typed methods below and are atomic with respect to
/// readers; a reader never observes a torn update.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<RwLock<ProgressSnapshot>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to idle defaults (start of a new pass)
    pub async fn reset(&self) {
        *self.inner.write().await = ProgressSnapshot::default();
    }

    /// Mark the pass as processing with a fresh message and zeroed counters
    pub async fn begin(&self, message: String) {
        let mut snapshot = self.inner.write().await;
        *snapshot = ProgressSnapshot {
            status: ProgressStatus::Processing,
            message,
            ..ProgressSnapshot::default()
        };
    }

    /// Record the total row count once it is known
    pub async fn set_total(&self, total_rows: usize, message: String) {
        let mut snapshot = self.inner.write().await;
        snapshot.status = ProgressStatus::Processing;
        snapshot.total_rows = total_rows;
        snapshot.message = message;
    }

    /// Cadence update from the row loop
    pub async fn row_update(
        &self,
        current_row: usize,
        processed_rows: usize,
        error_rows: usize,
        progress_percent: f64,
        message: String,
    ) {
        let mut snapshot = self.inner.write().await;
        snapshot.status = ProgressStatus::Processing;
        snapshot.current_row = current_row;
        snapshot.processed_rows = processed_rows;
        snapshot.error_rows = error_rows;
        snapshot.progress_percent = progress_percent;
        snapshot.message = message;
    }

    /// Update just the running tallies between cadence updates
    pub async fn counts(&self, processed_rows: usize, error_rows: usize) {
        let mut snapshot = self.inner.write().await;
        snapshot.status = ProgressStatus::Processing;
        snapshot.processed_rows = processed_rows;
        snapshot.error_rows = error_rows;
    }

    /// Terminal success state for the pass
    pub async fn complete(&self, processed_rows: usize, error_rows: usize, message: String) {
        let mut snapshot = self.inner.write().await;
        snapshot.status = ProgressStatus::Completed;
        snapshot.processed_rows = processed_rows;
        snapshot.error_rows = error_rows;
        snapshot.progress_percent = 100.0;
        snapshot.message = message;
    }

    /// Terminal failure state for the pass
    pub async fn fail(&self, message: String) {
        let mut snapshot = self.inner.write().await;
        snapshot.status = ProgressStatus::Failed;
        snapshot.message = message;
    }

    /// Clone of the current snapshot; safe before any pass has run
    pub async fn snapshot(&self) -> ProgressSnapshot {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_idle_with_defaults() {
        let tracker = ProgressTracker::new();
        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot.status, ProgressStatus::Idle);
        assert_eq!(snapshot.message, "Ready for processing");
        assert_eq!(snapshot.progress_percent, 0.0);
    }

    #[tokio::test]
    async fn begin_resets_counters() {
        let tracker = ProgressTracker::new();
        tracker
            .row_update(7, 5, 2, 70.0, "Processing row 7".to_string())
            .await;
        tracker.begin("Starting".to_string()).await;

        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot.status, ProgressStatus::Processing);
        assert_eq!(snapshot.current_row, 0);
        assert_eq!(snapshot.processed_rows, 0);
        assert_eq!(snapshot.error_rows, 0);
    }

    #[tokio::test]
    async fn complete_pins_percent_to_hundred() {
        let tracker = ProgressTracker::new();
        tracker.begin("Starting".to_string()).await;
        tracker
            .complete(8, 2, "Processing completed".to_string())
            .await;

        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot.status, ProgressStatus::Completed);
        assert_eq!(snapshot.progress_percent, 100.0);
        assert_eq!(snapshot.processed_rows, 8);
        assert_eq!(snapshot.error_rows, 2);
    }

    #[tokio::test]
    async fn fail_is_terminal_with_message() {
        let tracker = ProgressTracker::new();
        tracker.begin("Starting".to_string()).await;
        tracker.fail("File not found".to_string()).await;

        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot.status, ProgressStatus::Failed);
        assert_eq!(snapshot.message, "File not found");
    }

    #[test]
    fn snapshot_serializes_lowercase_status() {
        let json = serde_json::to_string(&ProgressSnapshot::default()).unwrap();
        assert!(json.contains("\"status\":\"idle\""));
    }
}
