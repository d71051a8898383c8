//! Batch report and terminal-directory classification

use crate::models::{RowOutcome, TripParams};
use serde::{Deserialize, Serialize};

/// Minimum success rate (percent) for a partially-failed file to still be
/// routed to the processed directory. Inherited business rule; pending
/// product confirmation.
pub const PARTIAL_SUCCESS_THRESHOLD: f64 = 50.0;

/// Terminal directory chosen for a processed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Processed,
    Errors,
}

impl Destination {
    /// Classify a finished batch by its row tallies.
    ///
    /// - no rows seen at all: errors ("no rows processed")
    /// - no failures: processed
    /// - failures but success rate at or above the threshold: processed
    /// - otherwise: errors
    pub fn classify(total_rows: usize, error_rows: usize, success_rate: f64) -> Self {
        if total_rows == 0 {
            Destination::Errors
        } else if error_rows == 0 {
            Destination::Processed
        } else if success_rate >= PARTIAL_SUCCESS_THRESHOLD {
            Destination::Processed
        } else {
            Destination::Errors
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Processed => "processed",
            Destination::Errors => "errors",
        }
    }
}

/// Success rate over a finished batch, percent rounded to one decimal
pub fn success_rate(processed_rows: usize, error_rows: usize) -> f64 {
    let total = processed_rows + error_rows;
    if total == 0 {
        return 0.0;
    }
    let rate = (processed_rows as f64 / total as f64) * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Aggregate result of processing one queued file
///
/// Serialized verbatim as the `.result.json` sidecar artifact next to the
/// moved file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Original (pre-move) filename
    pub original_filename: String,

    /// Rows priced and persisted
    pub processed_rows: usize,

    /// Rows rejected or failed
    pub error_rows: usize,

    /// Data rows seen (processed + error)
    pub total_rows: usize,

    /// processed / (processed + error) × 100, one decimal
    pub success_rate: f64,

    /// Terminal directory this file was routed to
    pub destination: Destination,

    /// Trip parameter override applied to every row
    pub params_used: TripParams,

    /// Ordered per-row outcomes
    pub results: Vec<RowOutcome>,
}

impl BatchReport {
    /// Build the final report from the loop tallies
    pub fn new(
        original_filename: String,
        processed_rows: usize,
        error_rows: usize,
        params_used: TripParams,
        results: Vec<RowOutcome>,
    ) -> Self {
        let total_rows = processed_rows + error_rows;
        let success_rate = success_rate(processed_rows, error_rows);
        let destination = Destination::classify(total_rows, error_rows, success_rate);
        Self {
            original_filename,
            processed_rows,
            error_rows,
            total_rows,
            success_rate,
            destination,
            params_used,
            results,
        }
    }
}
