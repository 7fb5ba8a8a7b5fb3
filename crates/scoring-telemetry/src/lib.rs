//! Structured logging for the scoring API.
//!
//! Every request produces a start line, an error line for handler faults,
//! and one completion line carrying the request context:
//!
//! ```text
//! INFO request_id=0190... http.method=POST http.path=/method body={"login":...} Request started
//! INFO request_id=0190... http.status_code=200 duration_ms=1 nclients=Some(2) has=None response={"code":200,...} Request completed
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use scoring_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! scoring_telemetry::log_request_error!("req-1", "store unavailable");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
