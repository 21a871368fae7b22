use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Seed data for the in-memory collaborators
    #[serde(default)]
    pub fixtures: FixturesConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Sync validations
        if self.sync.interval_secs == 0 {
            return Err("sync.interval_secs must be >= 1".into());
        }
        if self.sync.call_timeout_ms == 0 {
            return Err("sync.call_timeout_ms must be > 0".into());
        }
        if self.sync.concurrency == 0 {
            return Err("sync.concurrency must be > 0".into());
        }
        // Logging validation
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        for (key, value) in [
            ("logging.level", &self.logging.level),
            ("logging.dependency_level", &self.logging.dependency_level),
        ] {
            if !valid_levels.contains(&value.to_ascii_lowercase().as_str()) {
                return Err(format!("{key} must be one of {valid_levels:?}"));
            }
        }
        if let Some(path) = &self.fixtures.path {
            if path.trim().is_empty() {
                return Err("fixtures.path must not be empty when set".into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between level-triggered passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Deadline for every single store or spoke call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Works synced in parallel during one pass.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Also reconcile works as soon as they change.
    #[serde(default = "default_edge_triggered")]
    pub edge_triggered: bool,
}

fn default_interval_secs() -> u64 {
    60
}
fn default_call_timeout_ms() -> u64 {
    10_000
}
fn default_concurrency() -> usize {
    4
}
fn default_edge_triggered() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            call_timeout_ms: default_call_timeout_ms(),
            concurrency: default_concurrency(),
            edge_triggered: default_edge_triggered(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for the agent's own crates.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Level for everything else (runtime, config loading).
    #[serde(default = "default_dependency_level")]
    pub dependency_level: String,
}
fn default_log_level() -> String {
    "info".into()
}
fn default_dependency_level() -> String {
    "warn".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dependency_level: default_dependency_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FixturesConfig {
    /// JSON file with `works` and `objects` arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_PATH: &str = "workstatus.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., WORKSTATUS__SYNC__INTERVAL_SECS=5
        builder = builder.add_source(
            Environment::with_prefix("WORKSTATUS")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<AppConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
