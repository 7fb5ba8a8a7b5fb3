//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::collections::BTreeMap;
use std::path::PathBuf;

use scoring_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use scoring_config::ServerSection;
///
/// let config = ServerSection {
///     port: 9000,
///     ..Default::default()
/// };
/// assert_eq!(config.http_addr(), "127.0.0.1:9000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind. `0` picks an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerSection {
    /// Returns `host:port`.
    #[must_use]
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_shutdown_timeout() -> u64 {
    10
}

const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Log level or filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Append logs to this file instead of stdout.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingSection {
    /// Converts the section into a telemetry [`LogConfig`].
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level.clone(),
            format: self.format,
            file: self.file.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Authentication configuration section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Reject requests whose token does not match.
    #[serde(default = "default_true")]
    pub enforce: bool,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self { enforce: true }
    }
}

const fn default_true() -> bool {
    true
}

/// In-memory store seed data.
///
/// ```toml
/// [store.interests]
/// "1" = ["books", "hi-tech"]
/// "2" = ["tv"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Interests per client id.
    #[serde(default)]
    pub interests: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerSection::default();
        assert_eq!(config.http_addr(), "127.0.0.1:8080");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.shutdown_timeout_secs, 10);
        assert_eq!(config.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_server_unknown_field_rejected() {
        let result: Result<ServerSection, _> = toml::from_str("listen = \"0.0.0.0\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_to_log_config() {
        let section = LoggingSection {
            level: "debug".to_string(),
            format: LogFormat::Json,
            file: Some(PathBuf::from("/tmp/api.log")),
        };

        let config = section.to_log_config();
        assert!(config.enabled);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/api.log")));
    }

    #[test]
    fn test_auth_enforced_by_default() {
        assert!(AuthSection::default().enforce);
        let section: AuthSection = toml::from_str("").unwrap();
        assert!(section.enforce);
    }

    #[test]
    fn test_store_interests_parse() {
        let section: StoreSection = toml::from_str(
            r#"
            [interests]
            "1" = ["books"]
            "2" = []
            "#,
        )
        .unwrap();

        assert_eq!(section.interests["1"], ["books"]);
        assert!(section.interests["2"].is_empty());
    }
}
