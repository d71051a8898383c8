//! Service modules for the batch automation pipeline

pub mod batch_processor;
pub mod file_router;
pub mod icao_client;
pub mod oracle;
pub mod row_normalizer;
pub mod scheduler;

pub use batch_processor::{flight_summary, BatchProcessor, FileError, DEFAULT_COMMIT_BATCH_SIZE};
pub use icao_client::IcaoClient;
pub use oracle::{EmissionsEstimate, EmissionsOracle, OracleError};
pub use row_normalizer::{normalize_row, validate_airport_code, CanonicalRow, HeaderMap};
pub use scheduler::{AutomationScheduler, CacheInfo, FileSummary, PassOutcome};
