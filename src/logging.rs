//! File logger shared by the command-line tools.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::format_description;

/// `<dir>/<YYYY-mm-dd_HH-MM-SS>+<run_name>.log`
pub fn log_file_path(dir: &Path, run_name: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("{timestamp}+{run_name}.log"))
}

/// Install the global file logger. Returns the log file path.
pub fn init(dir: &Path, run_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let log_path = log_file_path(dir, run_name);
    let log_file = fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;

    WriteLogger::init(
        LevelFilter::Info,
        ConfigBuilder::new()
            .set_time_format_custom(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .build(),
        log_file,
    )
    .map_err(|e| anyhow!("failed to initialise file logger: {e}"))?;

    log::info!("{run_name} started");
    Ok(log_path)
}
