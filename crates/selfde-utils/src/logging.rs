//! # Logging Utilities
//!
//! Logging infrastructure for Selfde using `tracing`.
//!
//! The core library only emits events; binaries and tests call one of the
//! initializers here exactly once to install a subscriber.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use selfde_utils::init_logging;
//!
//! // Initialize with default settings (reads from RUST_LOG env var)
//! init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=selfde_core=trace`)
//! - `SELFDE_LOG_FORMAT`: Set output format (`pretty`, `compact` or `json`, default: `pretty`)
//! - `SELFDE_LOG_FILE`: Optional path to a log file, written in addition to stderr
//!
//! ## Examples
//!
//! ```rust,no_run
//! use selfde_utils::{LogFormat, LogLevel, LoggingConfig, init_logging_with};
//!
//! let config = LoggingConfig {
//!     level: Some(LogLevel::Debug),
//!     format: LogFormat::Compact,
//!     ..LoggingConfig::default()
//! };
//! init_logging_with(&config).expect("Failed to initialize logging");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "SELFDE_LOG_FORMAT";
/// Environment variable naming a log file
pub const LOG_FILE_ENV: &str = "SELFDE_LOG_FILE";

// Keeps the non-blocking file writer flushing for the life of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Multi-line, human-readable (default)
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "compact" | "short" => Ok(LogFormat::Compact),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Explicit logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingConfig
{
    /// Fixed level; `None` defers to `RUST_LOG`, then `info`
    pub level: Option<LogLevel>,
    /// Console output format
    pub format: LogFormat,
    /// Optional log file written alongside the console
    pub file: Option<PathBuf>,
}

impl LoggingConfig
{
    /// Configuration from `SELFDE_LOG_FORMAT` and `SELFDE_LOG_FILE`.
    ///
    /// ## Errors
    ///
    /// [`LoggingError::InvalidFormat`] if `SELFDE_LOG_FORMAT` is set to an unknown value.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        let format = match env::var(LOG_FORMAT_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => LogFormat::default(),
        };
        let file = env::var_os(LOG_FILE_ENV).map(PathBuf::from);

        Ok(Self {
            level: None,
            format,
            file,
        })
    }

    fn filter(&self) -> EnvFilter
    {
        // Priority:
        // 1. explicit level (e.g. from --verbose)
        // 2. RUST_LOG, which may carry per-module directives
        // 3. INFO
        match self.level {
            Some(level) => EnvFilter::new(Level::from(level).to_string()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        }
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `selfde_core=debug`)
/// - `SELFDE_LOG_FORMAT`: Output format (`pretty`, `compact` or `json`, default: `pretty`)
/// - `SELFDE_LOG_FILE`: Optional path to log file
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `SELFDE_LOG_FORMAT` holds an unknown format
/// - The log file's directory cannot be created
pub fn init_logging() -> Result<(), LoggingError>
{
    init_logging_with(&LoggingConfig::from_env()?)
}

/// Initialize logging with explicit level and format
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_logging_with(&LoggingConfig {
        level: Some(level),
        format,
        file: None,
    })
}

/// Initialize logging from an explicit [`LoggingConfig`]
///
/// Console output goes to stderr so command output on stdout stays clean.
///
/// ## Errors
///
/// - [`LoggingError::AlreadyInitialized`] if a global subscriber is installed
/// - [`LoggingError::FileError`] if the log file's directory cannot be created
pub fn init_logging_with(config: &LoggingConfig) -> Result<(), LoggingError>
{
    let console_layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_names(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr)
            .with_filter(config.filter())
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_thread_names(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr)
            .with_filter(config.filter())
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_writer(io::stderr)
            .with_filter(config.filter())
            .boxed(),
    };

    let file_layer = match &config.file {
        Some(path) => {
            let (directory, file_name) = split_log_path(path)?;
            let file_appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            if FILE_GUARD.set(guard).is_err() {
                return Err(LoggingError::AlreadyInitialized);
            }
            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false) // No ANSI in files
                    .with_filter(config.filter()),
            )
        }
        None => None,
    };

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

/// Default log file name for a session started now, e.g. `2025-01-31-selfde.log`.
pub fn dated_log_file_name() -> String
{
    format!("{}-selfde.log", Utc::now().format("%Y-%m-%d"))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError>
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory).map_err(LoggingError::FileError)?;

    let file_name = match path.file_name() {
        Some(name) => PathBuf::from(name),
        None => PathBuf::from(dated_log_file_name()),
    };
    Ok((directory, file_name))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}. Use 'pretty', 'compact' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// A global subscriber is already installed
    #[error("Logging is already initialized")]
    AlreadyInitialized,

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
