//! Automation control API handlers
//!
//! Thin plumbing over the scheduler: manual trigger, progress polling,
//! cache inspection, queue listing, processed-directory sweep and the
//! persisted-results listing.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::calculations::{self, CalculationRow};
use crate::error::ApiResult;
use crate::models::{ProgressSnapshot, TripParams};
use crate::services::{file_router, CacheInfo, PassOutcome};
use crate::AppState;

/// POST /automation/trigger request
#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub batch_params: Option<TripParams>,
}

/// POST /automation/trigger response
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub message: String,
    pub batch_params: TripParams,
    pub result: PassOutcome,
}

/// POST /automation/trigger
///
/// Forced pass over every queued file, using the supplied trip parameters
/// (or the last-set/default parameters when the body is empty).
pub async fn trigger(
    State(state): State<AppState>,
    request: Option<Json<TriggerRequest>>,
) -> ApiResult<Json<TriggerResponse>> {
    let params = request
        .and_then(|Json(r)| r.batch_params)
        .map(TripParams::sanitized);

    info!(?params, "Manual automation trigger received");

    let result = state.scheduler.trigger_manual_run(params).await;
    let batch_params = state.scheduler.active_params().await;

    Ok(Json(TriggerResponse {
        success: true,
        message: "Manual processing triggered".to_string(),
        batch_params,
        result,
    }))
}

/// GET /automation/progress
///
/// Current progress snapshot, verbatim. Safe to call at any time; returns
/// the idle defaults before any pass has run.
pub async fn progress(State(state): State<AppState>) -> Json<ProgressSnapshot> {
    Json(state.scheduler.tracker().snapshot().await)
}

/// GET /automation/cache
pub async fn cache_info(State(state): State<AppState>) -> Json<CacheInfo> {
    Json(state.scheduler.cache_info().await)
}

/// POST /automation/cache/clear response
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub cleared: usize,
}

/// POST /automation/cache/clear
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.scheduler.clear_processed_cache().await;
    Json(ClearCacheResponse {
        success: true,
        cleared,
    })
}

/// Queued file entry
#[derive(Debug, Serialize)]
pub struct QueuedFileEntry {
    pub filename: String,
    pub size_kb: f64,
    pub upload_time: Option<DateTime<Utc>>,
}

/// GET /automation/queue response
#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub files: Vec<QueuedFileEntry>,
    pub total: usize,
}

/// GET /automation/queue
///
/// Files currently waiting in the scheduled directory, newest first.
pub async fn queue_files(State(state): State<AppState>) -> ApiResult<Json<QueueResponse>> {
    let paths = file_router::pending_csv_files(&state.scheduler.dirs().scheduled)?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };
        let metadata = std::fs::metadata(&path)?;
        let size_kb = (metadata.len() as f64 / 1024.0 * 100.0).round() / 100.0;
        let upload_time = metadata.modified().ok().map(DateTime::<Utc>::from);
        files.push(QueuedFileEntry {
            filename,
            size_kb,
            upload_time,
        });
    }

    // Newest first
    files.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
    let total = files.len();

    Ok(Json(QueueResponse { files, total }))
}

/// POST /automation/clear-processed response
#[derive(Debug, Serialize)]
pub struct ClearProcessedResponse {
    pub success: bool,
    pub message: String,
    pub backup_dir: String,
    pub moved_files: Vec<String>,
}

/// POST /automation/clear-processed
///
/// Sweeps processed CSVs into a timestamped backup directory instead of
/// deleting them.
pub async fn clear_processed(
    State(state): State<AppState>,
) -> ApiResult<Json<ClearProcessedResponse>> {
    let (backup_dir, moved_files) = state.scheduler.backup_processed().await?;
    Ok(Json(ClearProcessedResponse {
        success: true,
        message: format!("Moved {} files to backup", moved_files.len()),
        backup_dir: backup_dir.display().to_string(),
        moved_files,
    }))
}

/// GET /automation/results query
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub limit: Option<i64>,
}

/// GET /automation/results
///
/// Most recently persisted calculations, newest first.
pub async fn results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> ApiResult<Json<Vec<CalculationRow>>> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let rows = calculations::recent(&state.db, limit).await?;
    Ok(Json(rows))
}

/// Build automation control routes
pub fn automation_routes() -> Router<AppState> {
    Router::new()
        .route("/automation/trigger", post(trigger))
        .route("/automation/progress", get(progress))
        .route("/automation/cache", get(cache_info))
        .route("/automation/cache/clear", post(clear_cache))
        .route("/automation/queue", get(queue_files))
        .route("/automation/clear-processed", post(clear_processed))
        .route("/automation/results", get(results))
}
