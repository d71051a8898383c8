//! Data models for fcal-ba (Batch Automation microservice)

pub mod batch;
pub mod outcome;
pub mod progress;
pub mod schedule;
pub mod trip;

pub use batch::{success_rate, BatchReport, Destination, PARTIAL_SUCCESS_THRESHOLD};
pub use outcome::{RowError, RowOutcome};
pub use progress::{ProgressSnapshot, ProgressStatus, ProgressTracker};
pub use schedule::ScheduleSpec;
pub use trip::{CabinClass, TripParams};
