#![deny(missing_docs)]
//! Shared logging utilities for the publisher workspace.
//!
//! This crate provides the `pipeline_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Log lines emitted while
//! a pipeline run is active carry a `[run N]` tag.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of the pipeline run currently in flight; 0 before the first run.
static CURRENT_RUN: AtomicU64 = AtomicU64::new(0);

/// Allocates the next run identifier and makes it current.
/// Called once by the engine at the start of every pipeline run.
pub fn begin_run() -> u64 {
    CURRENT_RUN.fetch_add(1, Ordering::SeqCst) + 1
}

/// Retrieves the identifier of the current run.
/// Returns 0 if no run has begun in this process.
pub fn current_run() -> u64 {
    CURRENT_RUN.load(Ordering::SeqCst)
}

#[doc(hidden)]
pub fn run_tag() -> String {
    match current_run() {
        0 => String::new(),
        run => format!("[run {run}] "),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::run_tag(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::run_tag(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::run_tag(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::run_tag(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! pipeline_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::run_tag(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
