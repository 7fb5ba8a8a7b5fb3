//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Invalid log level or filter directive.
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to open the log file.
    #[error("Failed to open log file '{path}': {source}")]
    LogFile {
        /// The path that could not be opened.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
