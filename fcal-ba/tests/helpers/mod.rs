//! Shared test fixtures: temp queue directories, a file-backed database and
//! a scripted emissions oracle.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use fcal_ba::config::QueueDirs;
use fcal_ba::models::{ProgressTracker, TripParams};
use fcal_ba::services::{
    AutomationScheduler, BatchProcessor, EmissionsEstimate, EmissionsOracle, OracleError,
};
use fcal_common::events::EventBus;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Everything a pipeline test needs, rooted in a temp directory
pub struct TestHarness {
    // Held so the directory outlives the test
    #[allow(dead_code)]
    pub root: TempDir,
    pub dirs: QueueDirs,
    pub db: SqlitePool,
    pub tracker: ProgressTracker,
    pub event_bus: EventBus,
}

pub async fn harness() -> TestHarness {
    let root = tempfile::tempdir().expect("create temp root");
    let dirs = QueueDirs::new(root.path());
    dirs.ensure().expect("create queue dirs");

    let db = fcal_ba::db::init_database_pool(&root.path().join("fcal.db"))
        .await
        .expect("init database");

    TestHarness {
        root,
        dirs,
        db,
        tracker: ProgressTracker::new(),
        event_bus: EventBus::new(64),
    }
}

impl TestHarness {
    pub fn processor(&self, oracle: Arc<dyn EmissionsOracle>, batch_size: usize) -> BatchProcessor {
        BatchProcessor::new(
            self.db.clone(),
            oracle,
            self.tracker.clone(),
            self.event_bus.clone(),
            batch_size,
        )
    }

    pub fn scheduler(&self, oracle: Arc<dyn EmissionsOracle>) -> Arc<AutomationScheduler> {
        Arc::new(AutomationScheduler::new(
            self.processor(oracle, 50),
            self.dirs.clone(),
            self.event_bus.clone(),
        ))
    }

    /// Drop a file into the scheduled (pending) directory
    pub fn queue_file(&self, name: &str, content: &str) -> std::path::PathBuf {
        let path = self.dirs.scheduled.join(name);
        std::fs::write(&path, content).expect("write queue file");
        path
    }
}

/// Scripted oracle: succeeds with fixed figures unless the route is in the
/// failure set; optional per-call delay for concurrency tests.
pub struct ScriptedOracle {
    failures: HashSet<(String, String)>,
    delay: Option<Duration>,
}

impl ScriptedOracle {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            failures: HashSet::new(),
            delay: None,
        })
    }

    pub fn failing_for(routes: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            failures: routes
                .iter()
                .map(|(d, a)| (d.to_string(), a.to_string()))
                .collect(),
            delay: None,
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            failures: HashSet::new(),
            delay: Some(delay),
        })
    }
}

#[async_trait]
impl EmissionsOracle for ScriptedOracle {
    async fn estimate(
        &self,
        departure: &str,
        destination: &str,
        params: &TripParams,
    ) -> Result<EmissionsEstimate, OracleError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .failures
            .contains(&(departure.to_string(), destination.to_string()))
        {
            return Err(OracleError::Timeout);
        }

        let passengers = params.passengers as f64;
        Ok(EmissionsEstimate {
            fuel_burn_kg: 40.0 * passengers,
            total_co2_kg: 126.0 * passengers,
            co2_per_passenger_kg: 126.0,
            co2_tonnes: 0.126 * passengers,
            distance_km: 1000.0,
            distance_miles: 621.0,
            data_source: "SCRIPTED".to_string(),
        })
    }
}

/// Names of CSV files currently in a directory, sorted
pub fn csv_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|n| n.ends_with(".csv"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
