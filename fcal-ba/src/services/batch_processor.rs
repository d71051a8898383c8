//! Per-file batch processing
//!
//! Drives the row loop over one queued CSV file: normalize, price through
//! the emissions oracle, persist, tally. A single row's failure never aborts
//! the file; whole-file conditions (missing file, no header) fail fast
//! before any row is touched and leave the progress snapshot in a terminal
//! failed state.

use crate::db::{airports, calculations};
use crate::models::{BatchReport, ProgressTracker, RowError, RowOutcome, TripParams};
use crate::services::oracle::EmissionsOracle;
use crate::services::row_normalizer::{self, HeaderMap};
use fcal_common::events::{AutomationEvent, EventBus};
use sqlx::{Acquire, Sqlite, SqlitePool, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Successful rows persisted per transaction commit
pub const DEFAULT_COMMIT_BATCH_SIZE: usize = 50;

/// Progress snapshot refresh cadence, in rows
const PROGRESS_CADENCE: usize = 5;

/// Whole-file processing errors
///
/// Raised before or outside the row loop; row-level failures are tallied in
/// the batch report instead.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Empty CSV file: {0}")]
    Empty(PathBuf),

    #[error("Failed to read {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Batch processor for queued CSV files
pub struct BatchProcessor {
    db: SqlitePool,
    oracle: Arc<dyn EmissionsOracle>,
    tracker: ProgressTracker,
    event_bus: EventBus,
    commit_batch_size: usize,
}

impl BatchProcessor {
    pub fn new(
        db: SqlitePool,
        oracle: Arc<dyn EmissionsOracle>,
        tracker: ProgressTracker,
        event_bus: EventBus,
        commit_batch_size: usize,
    ) -> Self {
        Self {
            db,
            oracle,
            tracker,
            event_bus,
            commit_batch_size: commit_batch_size.max(1),
        }
    }

    /// Shared progress tracker written by this processor
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Process one queued file and produce its batch report.
    ///
    /// Rows are processed strictly in file order, 1-indexed after the
    /// header. The caller is responsible for moving the file to the
    /// destination the report names.
    pub async fn process_file(
        &self,
        pass_id: Uuid,
        path: &Path,
        params: &TripParams,
    ) -> Result<BatchReport, FileError> {
        let filename = file_name_of(path);

        self.tracker
            .begin(format!("Starting processing of {}", filename))
            .await;

        if !path.exists() {
            self.tracker
                .fail(format!("File not found: {}", path.display()))
                .await;
            return Err(FileError::NotFound(path.to_path_buf()));
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                self.tracker
                    .fail(format!("Failed to read {}: {}", filename, e))
                    .await;
                return Err(FileError::Io(path.to_path_buf(), e));
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut records = reader.records();

        let header = match records.next() {
            Some(Ok(record)) => HeaderMap::from_record(&record),
            Some(Err(e)) => {
                self.tracker
                    .fail(format!("Unreadable CSV header in {}: {}", filename, e))
                    .await;
                return Err(FileError::Empty(path.to_path_buf()));
            }
            None => {
                self.tracker.fail("Empty CSV file".to_string()).await;
                return Err(FileError::Empty(path.to_path_buf()));
            }
        };
        debug!(file = %filename, header = ?header.fields(), "CSV header cleaned");

        // Single pre-pass row count to seed the snapshot
        let rows: Vec<Result<csv::StringRecord, csv::Error>> = records.collect();
        let total_rows = rows.len();

        self.tracker
            .set_total(
                total_rows,
                format!("Processing {} rows from {}", total_rows, filename),
            )
            .await;

        let mut tx: Transaction<'static, Sqlite> = match self.db.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.tracker
                    .fail(format!("Database error: {}", e))
                    .await;
                return Err(FileError::Database(e));
            }
        };

        let mut processed_rows = 0usize;
        let mut error_rows = 0usize;
        let mut uncommitted = 0usize;
        let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(total_rows);

        for (i, record_result) in rows.into_iter().enumerate() {
            let row_idx = i + 1;

            if row_idx == 1 || row_idx % PROGRESS_CADENCE == 0 {
                let percent = percent_complete(row_idx - 1, total_rows);
                self.tracker
                    .row_update(
                        row_idx,
                        processed_rows,
                        error_rows,
                        percent,
                        format!(
                            "Processing row {} of {} - {} successful, {} failed",
                            row_idx, total_rows, processed_rows, error_rows
                        ),
                    )
                    .await;
                self.event_bus.emit_lossy(AutomationEvent::RowProgress {
                    pass_id,
                    filename: filename.clone(),
                    current_row: row_idx,
                    total_rows,
                    processed_rows,
                    error_rows,
                    progress_percent: percent,
                    timestamp: chrono::Utc::now(),
                });
            }

            let record = match record_result {
                Ok(record) => record,
                Err(e) => {
                    let reason = RowError::Unexpected(e.to_string());
                    warn!(file = %filename, row = row_idx, "Unreadable CSV record: {}", e);
                    error_rows += 1;
                    outcomes.push(RowOutcome::failure(row_idx, &reason));
                    self.tracker.counts(processed_rows, error_rows).await;
                    continue;
                }
            };

            let row = match row_normalizer::normalize_row(&header, &record, params) {
                Ok(row) => row,
                Err(reason) => {
                    warn!(file = %filename, row = row_idx, reason = %reason, "Row rejected");
                    error_rows += 1;
                    outcomes.push(RowOutcome::failure(row_idx, &reason));
                    self.tracker.counts(processed_rows, error_rows).await;
                    continue;
                }
            };

            debug!(
                file = %filename,
                row = row_idx,
                departure = %row.departure,
                destination = %row.destination,
                "Pricing route"
            );

            let estimate = match self
                .oracle
                .estimate(&row.departure, &row.destination, params)
                .await
            {
                Ok(estimate) => estimate,
                Err(e) => {
                    warn!(
                        file = %filename,
                        row = row_idx,
                        departure = %row.departure,
                        destination = %row.destination,
                        "Emissions call failed: {}",
                        e
                    );
                    let reason = RowError::Oracle(e.to_string());
                    error_rows += 1;
                    outcomes.push(RowOutcome::failure(row_idx, &reason));
                    self.tracker.counts(processed_rows, error_rows).await;
                    continue;
                }
            };

            // Best-effort reference lookup; a missing airport never blocks
            // persistence
            let departure_airport_id =
                match airports::airport_id(&mut *tx, &row.departure).await {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(code = %row.departure, "Airport lookup failed: {}", e);
                        None
                    }
                };
            let destination_airport_id =
                match airports::airport_id(&mut *tx, &row.destination).await {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(code = %row.destination, "Airport lookup failed: {}", e);
                        None
                    }
                };

            let flight_info =
                flight_summary(&row.departure, &row.destination, estimate.distance_km, params);

            // Savepoint isolates this row's work; a failed insert rolls back
            // the row without touching earlier uncommitted successes
            let insert_result = async {
                let mut savepoint = tx.begin().await?;
                let id = calculations::insert(
                    &mut *savepoint,
                    &calculations::NewCalculation {
                        departure: &row.departure,
                        destination: &row.destination,
                        departure_airport_id,
                        destination_airport_id,
                        params,
                        estimate: &estimate,
                        flight_info: &flight_info,
                    },
                )
                .await?;
                savepoint.commit().await?;
                Ok::<i64, sqlx::Error>(id)
            }
            .await;

            match insert_result {
                Ok(calculation_id) => {
                    processed_rows += 1;
                    uncommitted += 1;
                    outcomes.push(RowOutcome::success(
                        row_idx,
                        &row.departure,
                        &row.destination,
                        calculation_id,
                    ));
                    self.tracker.counts(processed_rows, error_rows).await;
                    debug!(
                        file = %filename,
                        row = row_idx,
                        calculation_id,
                        "Row persisted"
                    );

                    if uncommitted >= self.commit_batch_size {
                        if let Err(e) = tx.commit().await {
                            error!(file = %filename, "Batch commit failed: {}", e);
                        }
                        tx = match self.db.begin().await {
                            Ok(tx) => tx,
                            Err(e) => {
                                self.tracker
                                    .fail(format!("Database error: {}", e))
                                    .await;
                                return Err(FileError::Database(e));
                            }
                        };
                        uncommitted = 0;
                    }
                }
                Err(e) => {
                    warn!(file = %filename, row = row_idx, "Persistence failed: {}", e);
                    let reason = RowError::Persistence(e.to_string());
                    error_rows += 1;
                    outcomes.push(RowOutcome::failure(row_idx, &reason));
                    self.tracker.counts(processed_rows, error_rows).await;
                }
            }
        }

        // Final commit flushes the remainder
        if let Err(e) = tx.commit().await {
            error!(file = %filename, "Final commit failed: {}", e);
        }

        let report = BatchReport::new(
            filename.clone(),
            processed_rows,
            error_rows,
            *params,
            outcomes,
        );

        self.tracker
            .complete(
                processed_rows,
                error_rows,
                format!(
                    "Processing completed: {} successful, {} errors",
                    processed_rows, error_rows
                ),
            )
            .await;

        info!(
            file = %filename,
            processed = processed_rows,
            errors = error_rows,
            success_rate = report.success_rate,
            "File processing complete"
        );

        Ok(report)
    }
}

/// Human-readable summary persisted with each calculation:
/// "JFK to LAX - 3974km (Round Trip) • Business"
pub fn flight_summary(
    departure: &str,
    destination: &str,
    distance_km: f64,
    params: &TripParams,
) -> String {
    let mut info = format!("{} to {} - {}km", departure, destination, distance_km);
    if params.round_trip {
        info.push_str(" (Round Trip)");
    }
    info.push_str(&format!(" \u{2022} {}", params.cabin_class.display_name()));
    info
}

fn percent_complete(rows_seen: usize, total_rows: usize) -> f64 {
    if total_rows == 0 {
        0.0
    } else {
        (rows_seen as f64 / total_rows as f64) * 100.0
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CabinClass;

    #[test]
    fn flight_summary_one_way_economy() {
        let params = TripParams::default();
        assert_eq!(
            flight_summary("JFK", "LAX", 3974.0, &params),
            "JFK to LAX - 3974km \u{2022} Economy"
        );
    }

    #[test]
    fn flight_summary_round_trip_premium() {
        let params = TripParams {
            passengers: 2,
            cabin_class: CabinClass::PremiumEconomy,
            round_trip: true,
        };
        assert_eq!(
            flight_summary("CDG", "NRT", 9712.0, &params),
            "CDG to NRT - 9712km (Round Trip) \u{2022} Premium Economy"
        );
    }

    #[test]
    fn percent_is_zero_for_empty_file() {
        assert_eq!(percent_complete(0, 0), 0.0);
        assert_eq!(percent_complete(5, 10), 50.0);
    }
}
