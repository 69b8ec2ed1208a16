//! Logger setup for the binary.
//!
//! Logs go to the terminal and are appended to `logs/publisher_<YYYYMMDD>.log`.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const LOG_DIR: &str = "logs";

/// Initialize terminal and file logging; returns the log file path.
pub fn initialize(level: LevelFilter, dir: &Path, today: NaiveDate) -> anyhow::Result<PathBuf> {
    let config = build_config();
    let path = dir.join(log_file_name(today));
    let file = open_log_file(&path)?;

    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, config, file),
    ];
    // A logger may already be installed (tests); keep it.
    let _ = CombinedLogger::init(loggers);
    Ok(path)
}

pub fn log_file_name(date: NaiveDate) -> String {
    format!("publisher_{}.log", date.format("%Y%m%d"))
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
