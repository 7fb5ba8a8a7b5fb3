//! Root configuration type.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AuthSection, ConfigError, LoggingSection, ServerSection, StoreSection};

/// Level names accepted as a bare `logging.level`.
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Complete scoring API configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use scoring_config::ScoringConfig;
///
/// let config = ScoringConfig::default();
/// assert_eq!(config.server.port, 8080);
/// assert!(config.auth.enforce);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthSection,

    /// In-memory store seed data.
    #[serde(default)]
    pub store: StoreSection,
}

impl ScoringConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `server.host`/`server.port` do not form a socket address
    /// - `server.request_timeout_secs` is zero
    /// - `logging.level` is not a level name or filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than zero",
            ));
        }

        validate_log_level(&self.logging.level)
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = self.server.http_addr();
        addr.parse().map_err(|_| {
            ConfigError::invalid_value("server.host", format!("invalid socket address: {addr}"))
        })
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    let is_directive = level.contains('=') || level.contains(',');
    if !is_directive && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::invalid_value(
            "logging.level",
            format!("unknown log level '{level}'"),
        ));
    }

    scoring_telemetry::create_env_filter(level)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))
}
