//! fcal-ba - Batch Automation Microservice
//!
//! Watches a queue directory for CSV route files, prices each row through
//! the ICAO emissions API on a schedule or on demand, persists successful
//! calculations and routes every input file to a terminal directory by
//! outcome.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fcal_ba::config::{QueueDirs, ServiceSettings};
use fcal_ba::models::ProgressTracker;
use fcal_ba::services::{AutomationScheduler, BatchProcessor, IcaoClient};
use fcal_ba::AppState;
use fcal_common::events::EventBus;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ServiceSettings::resolve()?;

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&settings.log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting fcal-ba (Batch Automation) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Queue directories under the root folder
    let dirs = QueueDirs::new(&settings.root_folder);
    dirs.ensure()?;
    info!("Queue directories ready under {}", dirs.root.display());

    // Open or create the database
    let db_path = settings.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = fcal_ba::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Event bus for SSE broadcasting
    let event_bus = EventBus::new(100);
    let tracker = ProgressTracker::new();

    // Emissions oracle client
    let oracle = Arc::new(IcaoClient::new(settings.icao_endpoint.clone())?);

    // Batch processor and scheduler
    let processor = BatchProcessor::new(
        db_pool.clone(),
        oracle,
        tracker,
        event_bus.clone(),
        settings.commit_batch_size,
    );
    let scheduler = Arc::new(AutomationScheduler::new(processor, dirs, event_bus.clone()));
    scheduler.register(settings.schedule).await;
    info!("Schedule: {}", settings.schedule.describe());
    scheduler.start().await;

    // Create application state and serve
    let state = AppState::new(db_pool, event_bus, scheduler);
    let app = fcal_ba::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:5731").await?;
    info!("Listening on http://127.0.0.1:5731");
    info!("Health check: http://127.0.0.1:5731/health");

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
