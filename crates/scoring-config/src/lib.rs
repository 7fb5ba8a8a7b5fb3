//! Layered configuration for the scoring API.
//!
//! Configuration is resolved in layers, later layers winning:
//! defaults → TOML/JSON file → `SCORING__SECTION__KEY` environment
//! variables. Unknown fields are rejected in every section.
//!
//! # Example
//!
//! ```no_run
//! use scoring_config::ConfigLoader;
//!
//! # fn main() -> Result<(), scoring_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("scoring.toml")?
//!     .with_env_prefix("SCORING")
//!     .load()?;
//!
//! println!("Listening on {}", config.server.http_addr());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! request_timeout_secs = 30
//! shutdown_timeout_secs = 10
//! max_body_bytes = 1048576
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! file = "/var/log/scoring.log"
//!
//! [auth]
//! enforce = true
//!
//! [store.interests]
//! "1" = ["books", "hi-tech"]
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::ScoringConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX};
pub use schema::{AuthSection, LoggingSection, ServerSection, StoreSection};
