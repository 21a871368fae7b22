use std::{env, sync::Arc};

use tokio::sync::watch;
use workstatus_agent::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use workstatus_agent::{Agent, Fixtures, LoggingConfig, observability};
use workstatus_db_memory::{InMemorySpokeClient, InMemoryWorkStore};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From WORKSTATUS_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (workstatus.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (WORKSTATUS_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    observability::init_tracing(&LoggingConfig::default());

    let (config_path, source) = resolve_config_path();

    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    if env::args().any(|arg| arg == "--print-config") {
        match toml::to_string_pretty(&cfg) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("Failed to render configuration: {e}");
                std::process::exit(2);
            }
        }
        return;
    }

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );
    observability::apply_logging(&cfg.logging);

    let store = Arc::new(InMemoryWorkStore::new());
    let spoke = Arc::new(InMemorySpokeClient::new());

    if let Some(path) = &cfg.fixtures.path {
        let seeded = Fixtures::load(path).and_then(|fixtures| fixtures.seed(&store, &spoke));
        if let Err(e) = seeded {
            eprintln!("Fixtures error: {e:#}");
            std::process::exit(2);
        }
    } else {
        tracing::warn!("No fixtures configured, starting with an empty hub");
    }

    let events = store.events().subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = Agent::new(&cfg.sync, store, spoke).start(Some(events), shutdown_rx);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    handle.join().await;
    tracing::info!("Agent stopped");
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: WORKSTATUS_CONFIG
/// 3. Default: workstatus.toml
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = env::var("WORKSTATUS_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    (DEFAULT_CONFIG_PATH.to_string(), ConfigSource::Default)
}
