//! Event types for the FCAL event system
//!
//! Provides the automation event definitions and the EventBus used to fan
//! them out to SSE subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Automation events broadcast during batch processing
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AutomationEvent {
    /// A processing pass acquired the guard and started
    PassStarted {
        pass_id: Uuid,
        /// True when the pass bypasses the processed-file cache
        forced: bool,
        /// Number of files eligible for this pass
        files: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One queued file began processing
    FileStarted {
        pass_id: Uuid,
        filename: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Row-level progress inside the current file
    RowProgress {
        pass_id: Uuid,
        filename: String,
        current_row: usize,
        total_rows: usize,
        processed_rows: usize,
        error_rows: usize,
        progress_percent: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One queued file finished and was routed to a terminal directory
    FileCompleted {
        pass_id: Uuid,
        filename: String,
        destination: String,
        processed_rows: usize,
        error_rows: usize,
        success_rate: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One queued file failed at the whole-file level
    FileFailed {
        pass_id: Uuid,
        filename: String,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The processing pass finished and released the guard
    PassCompleted {
        pass_id: Uuid,
        files_processed: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl AutomationEvent {
    /// Event type name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            AutomationEvent::PassStarted { .. } => "pass_started",
            AutomationEvent::FileStarted { .. } => "file_started",
            AutomationEvent::RowProgress { .. } => "row_progress",
            AutomationEvent::FileCompleted { .. } => "file_completed",
            AutomationEvent::FileFailed { .. } => "file_failed",
            AutomationEvent::PassCompleted { .. } => "pass_completed",
        }
    }
}

/// Broadcast bus for automation events
///
/// Cloneable handle around a tokio broadcast channel. Subscribers receive
/// events emitted after subscription; slow subscribers drop oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AutomationEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<AutomationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress events are advisory; it is acceptable for nobody to be
    /// watching.
    pub fn emit_lossy(&self, event: AutomationEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit_lossy(AutomationEvent::PassStarted {
            pass_id: Uuid::new_v4(),
            forced: true,
            files: 3,
            timestamp: chrono::Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "pass_started");
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit_lossy(AutomationEvent::PassCompleted {
            pass_id: Uuid::new_v4(),
            files_processed: 0,
            timestamp: chrono::Utc::now(),
        });
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = AutomationEvent::FileCompleted {
            pass_id: Uuid::new_v4(),
            filename: "routes.csv".to_string(),
            destination: "processed".to_string(),
            processed_rows: 9,
            error_rows: 1,
            success_rate: 90.0,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"FileCompleted\""));
        assert!(json.contains("\"filename\":\"routes.csv\""));
    }
}
