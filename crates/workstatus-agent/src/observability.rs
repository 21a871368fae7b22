//! Tracing setup driven by [`LoggingConfig`].
//!
//! The agent's crates log at `logging.level`, everything else at
//! `logging.dependency_level`. The filter sits behind a reload handle so the
//! levels from the loaded configuration replace the bootstrap defaults.
//! `RUST_LOG`, when set, overrides both.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

/// Crates whose events follow `logging.level`.
const AGENT_TARGETS: &[&str] = &[
    "workstatus_agent",
    "workstatus_core",
    "workstatus_db_memory",
    "workstatus_feedback",
    "workstatus_storage",
];

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Filter directives for `logging`, e.g. `warn,workstatus_agent=info,...`.
pub fn filter_directives(logging: &LoggingConfig) -> String {
    let level = logging.level.to_ascii_lowercase();
    let mut directives = vec![logging.dependency_level.to_ascii_lowercase()];
    directives.extend(AGENT_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

fn env_override() -> Option<EnvFilter> {
    std::env::var_os("RUST_LOG")?;
    EnvFilter::try_from_default_env().ok()
}

/// Installs the global subscriber. Later calls keep the first subscriber.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = env_override().unwrap_or_else(|| EnvFilter::new(filter_directives(logging)));
    let (layer, handle) = reload::Layer::new(filter);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer())
        .try_init();
}

/// Swaps in the levels from `logging` unless `RUST_LOG` is set.
pub fn apply_logging(logging: &LoggingConfig) {
    if env_override().is_some() {
        return;
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return;
    };
    let directives = filter_directives(logging);
    if let Err(e) = handle.modify(|filter| *filter = EnvFilter::new(&directives)) {
        tracing::warn!(error = %e, "Failed to apply logging configuration");
        return;
    }
    tracing::debug!(filter = %directives, "Logging configuration applied");
}
