#![deny(missing_docs)]
//! Logging utilities shared by the vidfetch crates.
//!
//! The `vid_*` macros forward to the `log` facade so library crates never
//! depend on a concrete logger. Binaries pick the sink with [`initialize`];
//! tests use [`initialize_for_tests`].

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "vidfetch.log";

/// Logs a trace-level message.
#[macro_export]
macro_rules! vid_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message.
#[macro_export]
macro_rules! vid_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message.
#[macro_export]
macro_rules! vid_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message.
#[macro_export]
macro_rules! vid_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message.
#[macro_export]
macro_rules! vid_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the log file only.
    File,
    /// Write to the terminal (stderr for warnings and errors).
    Terminal,
    /// Write to both file and terminal.
    Both,
}

/// Initializes the global logger.
///
/// `log_file` is only consulted for [`LogDestination::File`] and
/// [`LogDestination::Both`]; when it is `None` [`DEFAULT_LOG_FILE`] is used.
/// A file that cannot be created degrades to terminal-only (or no) logging
/// rather than failing the caller. Calling this twice keeps the first logger.
pub fn initialize(destination: LogDestination, level: LevelFilter, log_file: Option<&Path>) {
    let config = build_config();
    let path = log_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(destination, LogDestination::Terminal | LogDestination::Both) {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        if let Some(file_logger) = create_file_logger(level, config, &path) {
            loggers.push(file_logger);
        }
    }

    if loggers.is_empty() {
        return;
    }
    let _ = CombinedLogger::init(loggers);
}

/// Parses a level name such as `info` or `DEBUG`; unknown names give `None`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    path: &Path,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_accepts_any_case() {
        assert_eq!(parse_level("info"), Some(LevelFilter::Info));
        assert_eq!(parse_level(" DEBUG "), Some(LevelFilter::Debug));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("chatty"), None);
    }

    #[test]
    fn unwritable_log_file_is_skipped() {
        let temp = tempfile::TempDir::new().unwrap();
        // A directory cannot be opened as a log file.
        assert!(create_file_logger(LevelFilter::Info, build_config(), temp.path()).is_none());

        let path = temp.path().join("run.log");
        assert!(create_file_logger(LevelFilter::Info, build_config(), &path).is_some());
        assert!(path.exists());
    }
}
