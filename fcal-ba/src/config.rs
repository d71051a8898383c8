//! Service settings and queue directory layout for fcal-ba

use crate::models::ScheduleSpec;
use crate::services::batch_processor::DEFAULT_COMMIT_BATCH_SIZE;
use chrono::Weekday;
use fcal_common::config::{self, ScheduleConfig, ICAO_ENDPOINT_ENV};
use fcal_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Queue directory layout under the root folder
///
/// Pending files land in `scheduled`; terminal copies go to `processed` or
/// `errors`; ad-hoc `backup_<timestamp>` siblings are created when the
/// processed directory is cleared.
#[derive(Debug, Clone)]
pub struct QueueDirs {
    pub root: PathBuf,
    pub scheduled: PathBuf,
    pub processed: PathBuf,
    pub errors: PathBuf,
}

impl QueueDirs {
    pub fn new(root: &Path) -> Self {
        let data = root.join("data");
        Self {
            root: root.to_path_buf(),
            scheduled: data.join("scheduled"),
            processed: data.join("processed"),
            errors: data.join("errors"),
        }
    }

    /// Create all three queue directories if missing
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.scheduled)?;
        std::fs::create_dir_all(&self.processed)?;
        std::fs::create_dir_all(&self.errors)?;
        Ok(())
    }

    /// Backup directory path for a processed-directory sweep
    pub fn backup_dir(&self, timestamp: &str) -> PathBuf {
        self.root.join("data").join(format!("backup_{}", timestamp))
    }
}

/// Resolved runtime settings for the service
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub icao_endpoint: Option<String>,
    pub commit_batch_size: usize,
    pub schedule: ScheduleSpec,
}

impl ServiceSettings {
    /// Resolve settings from the TOML config with environment overrides
    pub fn resolve() -> Result<Self> {
        let toml_config = config::load_toml_config(None)?;
        Self::from_toml(&toml_config)
    }

    pub fn from_toml(toml_config: &config::TomlConfig) -> Result<Self> {
        let root_folder = config::resolve_root_folder(toml_config);
        let icao_endpoint = std::env::var(ICAO_ENDPOINT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| toml_config.icao_endpoint.clone());
        let commit_batch_size = toml_config
            .commit_batch_size
            .unwrap_or(DEFAULT_COMMIT_BATCH_SIZE)
            .max(1);
        let schedule = schedule_from_config(&toml_config.schedule)?;

        Ok(Self {
            root_folder,
            log_level: toml_config.logging.level.clone(),
            icao_endpoint,
            commit_batch_size,
            schedule,
        })
    }

    /// Database file path under the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join("fcal.db")
    }
}

/// Build a ScheduleSpec from the TOML schedule table
fn schedule_from_config(config: &ScheduleConfig) -> Result<ScheduleSpec> {
    let hour = config.hour;
    let minute = config.minute;
    match config.frequency.as_str() {
        "daily" => Ok(ScheduleSpec::Daily { hour, minute }),
        "weekly" => {
            let weekday: Weekday = config
                .weekday
                .as_deref()
                .unwrap_or("monday")
                .parse()
                .map_err(|_| {
                    Error::Config(format!(
                        "Invalid weekday in schedule: {:?}",
                        config.weekday
                    ))
                })?;
            Ok(ScheduleSpec::Weekly {
                weekday,
                hour,
                minute,
            })
        }
        "monthly" => {
            let day = config.day.unwrap_or(1);
            if !(1..=31).contains(&day) {
                return Err(Error::Config(format!(
                    "Invalid day of month in schedule: {}",
                    day
                )));
            }
            Ok(ScheduleSpec::Monthly { day, hour, minute })
        }
        other => Err(Error::Config(format!(
            "Unknown schedule frequency: {}",
            other
        ))),
    }
}
