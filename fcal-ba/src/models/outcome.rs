//! Per-row outcome types
//!
//! Every data row of a batch yields exactly one `RowOutcome`, appended in
//! file order and never mutated afterwards. Failure reasons keep their
//! distinct taxonomy so the sidecar artifact can be filtered later.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a single row can fail
///
/// Oracle failures carry the client's own reason text, which already
/// distinguishes timeout, transport, status, malformed payload and
/// empty-result cases.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RowError {
    #[error("insufficient columns")]
    InsufficientColumns,

    #[error("invalid airport code: {departure}\u{2192}{destination}")]
    InvalidAirportCode {
        departure: String,
        destination: String,
    },

    #[error("same airport: {code}")]
    SameAirport { code: String },

    #[error("{0}")]
    Oracle(String),

    #[error("database error: {0}")]
    Persistence(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Outcome of one processed row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    /// Row normalized, priced and persisted
    Success {
        /// 1-indexed data row number (header excluded)
        row: usize,
        departure: String,
        destination: String,
        /// Identifier of the persisted calculation record
        calculation_id: i64,
    },
    /// Row rejected or failed; reason drawn from the fixed taxonomy
    Failure { row: usize, reason: String },
}

impl RowOutcome {
    pub fn success(row: usize, departure: &str, destination: &str, calculation_id: i64) -> Self {
        RowOutcome::Success {
            row,
            departure: departure.to_string(),
            destination: destination.to_string(),
            calculation_id,
        }
    }

    pub fn failure(row: usize, error: &RowError) -> Self {
        RowOutcome::Failure {
            row,
            reason: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Success { .. })
    }

    pub fn row(&self) -> usize {
        match self {
            RowOutcome::Success { row, .. } | RowOutcome::Failure { row, .. } => *row,
        }
    }
}
