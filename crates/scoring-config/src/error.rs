//! Errors raised while resolving the scoring API configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration layer was rejected.
///
/// `field` and `var` name the offending setting the way an operator would
/// write it: a dotted file key such as `store.interests`, or the full
/// environment variable such as `SCORING__AUTH__ENFORCE`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The `--config` path does not exist.
    #[error("config file {path} does not exist")]
    FileNotFound {
        /// Path given on the command line.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("cannot read config file {path}")]
    Read {
        /// Path given on the command line.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or a key the schema does not know.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or a key the schema does not know.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither `toml` nor `json`.
    #[error("config format of {0} is not toml or json")]
    UnsupportedFormat(String),

    /// A setting parsed but is out of range, e.g. `server.host = "not a host"`.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted key of the setting.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `SCORING__*` override did not parse, e.g. `SCORING__AUTH__ENFORCE=maybe`.
    #[error("{var}: {reason}")]
    EnvParseError {
        /// Full variable name.
        var: String,
        /// What the variable should contain.
        reason: String,
    },
}

impl ConfigError {
    /// Rejects the setting `field`.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Rejects the environment override `var`.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_path() {
        let err = ConfigError::FileNotFound {
            path: "/etc/scoring/scoring.toml".into(),
        };
        assert_eq!(
            err.to_string(),
            "config file /etc/scoring/scoring.toml does not exist"
        );
    }

    #[test]
    fn test_read_error_keeps_source() {
        let err = ConfigError::Read {
            path: "scoring.toml".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_store_interests() {
        let err = ConfigError::invalid_value("store.interests", "expected a table of lists");
        assert_eq!(err.to_string(), "store.interests: expected a table of lists");
    }

    #[test]
    fn test_bad_auth_override() {
        let err = ConfigError::env_parse_error("SCORING__AUTH__ENFORCE", "expected boolean");
        assert!(matches!(
            &err,
            ConfigError::EnvParseError { var, .. } if var == "SCORING__AUTH__ENFORCE"
        ));
        assert_eq!(err.to_string(), "SCORING__AUTH__ENFORCE: expected boolean");
    }

    #[test]
    fn test_toml_error_converts() {
        let err: ConfigError = toml::from_str::<toml::Table>("[store.interests")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
