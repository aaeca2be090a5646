//! # Selfde Utilities
//!
//! Shared utilities for the Selfde workspace.
//!
//! Currently this is the logging setup built on `tracing`: library crates
//! only emit events, and the `selfde` binary (or a test harness) installs
//! the subscriber configured here.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_logging, init_logging_with, init_logging_with_level, LogFormat, LogLevel, LoggingConfig, LoggingError,
};
pub use tracing::{debug, error, info, trace, warn};
