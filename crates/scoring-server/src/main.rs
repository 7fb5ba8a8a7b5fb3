//! Scoring API - Entry point
//!
//! Loads configuration (defaults, optional file, `SCORING__*` environment
//! variables, then command-line flags), installs logging and serves
//! `POST /method` until SIGINT or SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use scoring_config::{ConfigLoader, ScoringConfig, ENV_PREFIX};
use scoring_core::MemoryStore;
use scoring_server::{MethodService, Server, ServerConfig};
use scoring_telemetry::init_logging;

/// Scoring API server.
#[derive(Parser, Debug)]
#[command(name = "scoring-api")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to listen on [default: 8080]
    #[arg(short, long)]
    port: Option<u16>,

    /// Append logs to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Interface to bind [default: 127.0.0.1]
    #[arg(long)]
    host: Option<String>,
}

impl Cli {
    /// Applies the flags on top of the loaded configuration.
    fn apply(&self, config: &mut ScoringConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(log) = &self.log {
            config.logging.file = Some(log.clone());
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ScoringConfig> {
    resolve_config(cli, ConfigLoader::new().with_defaults().with_env_prefix(ENV_PREFIX))
}

/// Layers the config file and the flags over `loader`, validating once at
/// the end so a flag can repair a bad file or environment value.
fn resolve_config(cli: &Cli, mut loader: ConfigLoader) -> anyhow::Result<ScoringConfig> {
    if let Some(path) = &cli.config {
        loader = loader
            .with_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
    }

    let mut config = loader.load_unvalidated()?;
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("scoring-api: invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging.to_log_config()) {
        eprintln!("scoring-api: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.http_addr(),
        seeded_clients = config.store.interests.len(),
        "Starting scoring API"
    );

    let store = MemoryStore::with_interests(config.store.interests.clone());
    let service = match MethodService::new(Arc::new(store)) {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Failed to build dispatcher");
            return ExitCode::FAILURE;
        }
    };

    let server = Server::new(ServerConfig::from_scoring_config(&config), service);
    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
