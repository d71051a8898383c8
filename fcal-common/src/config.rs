//! Configuration loading and root folder resolution
//!
//! The service resolves its root folder with ENV → TOML → platform default
//! priority, then reads the rest of its settings from the TOML file with
//! per-field environment overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "FCAL_ROOT_FOLDER";

/// Environment variable overriding the emissions API endpoint
pub const ICAO_ENDPOINT_ENV: &str = "FCAL_ICAO_ENDPOINT";

/// TOML configuration file for the batch automation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and queue directories
    pub root_folder: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Emissions API endpoint override (defaults to the ICAO ICEC service)
    pub icao_endpoint: Option<String>,

    /// Rows persisted per transaction commit during batch processing
    pub commit_batch_size: Option<usize>,

    /// Processing schedule
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            logging: LoggingConfig::default(),
            icao_endpoint: None,
            commit_batch_size: None,
            schedule: ScheduleConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Schedule settings as written in TOML
///
/// `frequency` is one of "daily", "weekly", "monthly". `weekday` applies to
/// weekly schedules ("monday" .. "sunday"), `day` to monthly schedules
/// (day of month, 1-based).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub frequency: String,
    pub weekday: Option<String>,
    pub day: Option<u32>,
    pub hour: u32,
    pub minute: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        // Nightly run at 02:00, matching the historical deployment
        Self {
            frequency: "daily".to_string(),
            weekday: None,
            day: None,
            hour: 2,
            minute: 0,
        }
    }
}

/// Resolve the service root folder.
///
/// Priority order:
/// 1. Environment variable (`FCAL_ROOT_FOLDER`)
/// 2. `root_folder` key in the TOML config file
/// 3. OS-dependent compiled default
pub fn resolve_root_folder(toml_config: &TomlConfig) -> PathBuf {
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    default_root_folder()
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/fcal (or /var/lib/fcal for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("fcal"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/fcal"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("fcal"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/fcal"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("fcal"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\fcal"))
    } else {
        PathBuf::from("./fcal_data")
    }
}

/// Default configuration file path for the platform (~/.config/fcal/fcal-ba.toml)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fcal").join("fcal-ba.toml"))
}

/// Load the TOML config from `path`, or defaults when the file is absent.
///
/// A present-but-unparseable file is an error; a missing file is not.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    if config.schedule.hour > 23 || config.schedule.minute > 59 {
        warn!(
            hour = config.schedule.hour,
            minute = config.schedule.minute,
            "Schedule time out of range, falling back to default"
        );
        return Ok(TomlConfig {
            schedule: ScheduleConfig::default(),
            ..config
        });
    }

    Ok(config)
}
