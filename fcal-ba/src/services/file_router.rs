//! Queue file routing
//!
//! Moves finished files into their terminal directory under a timestamped
//! name, writes the result sidecar, and sweeps the processed directory into
//! backups on demand.

use crate::config::QueueDirs;
use crate::models::BatchReport;
use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Timestamp prefix format used for moved files and backup directories
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// CSV files currently queued in a directory, sorted by name
pub fn pending_csv_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_csv(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Timestamped terminal name for a moved file
pub fn timestamped_name(now: &DateTime<Local>, original: &str) -> String {
    format!("{}_{}", now.format(TIMESTAMP_FORMAT), original)
}

/// Move a file into `target_dir` under `new_name`.
///
/// The target directory is created if missing; a failed rename falls back
/// to copy-and-remove for cross-device moves. The source is verified first
/// so a vanished file errors instead of clobbering.
pub fn safe_move(source: &Path, target_dir: &Path, new_name: &str) -> io::Result<PathBuf> {
    if !source.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Source file not found: {}", source.display()),
        ));
    }

    std::fs::create_dir_all(target_dir)?;
    let target = target_dir.join(new_name);

    if std::fs::rename(source, &target).is_err() {
        std::fs::copy(source, &target)?;
        std::fs::remove_file(source)?;
    }

    info!(
        "File moved: {} -> {}",
        source.display(),
        target.display()
    );
    Ok(target)
}

/// Write the batch report sidecar next to the moved file
/// (`<moved-name>.result.json`)
pub fn write_sidecar(dir: &Path, moved_name: &str, report: &BatchReport) -> io::Result<PathBuf> {
    let path = dir.join(format!("{}.result.json", moved_name));
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Sweep CSV files from the processed directory into a timestamped backup
/// directory, returning the backup path and the moved filenames.
pub fn backup_processed(
    dirs: &QueueDirs,
    now: &DateTime<Local>,
) -> io::Result<(PathBuf, Vec<String>)> {
    let backup_dir = dirs.backup_dir(&now.format(TIMESTAMP_FORMAT).to_string());
    let mut moved = Vec::new();

    if !dirs.processed.exists() {
        return Ok((backup_dir, moved));
    }

    std::fs::create_dir_all(&backup_dir)?;
    for entry in std::fs::read_dir(&dirs.processed)? {
        let path = entry?.path();
        if path.is_file() && is_csv(&path) {
            if let Some(name) = path.file_name() {
                let name = name.to_string_lossy().to_string();
                std::fs::rename(&path, backup_dir.join(&name))?;
                moved.push(name);
            }
        }
    }

    info!(
        count = moved.len(),
        backup_dir = %backup_dir.display(),
        "Processed files moved to backup"
    );
    Ok((backup_dir, moved))
}
