//! Seed data for the local, in-memory mode of the agent.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use workstatus_core::Work;
use workstatus_db_memory::{InMemorySpokeClient, InMemoryWorkStore};

/// Works to put in the hub and live objects to serve from the spoke.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub works: Vec<Work>,
    #[serde(default)]
    pub objects: Vec<Value>,
}

impl Fixtures {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixtures file: {}", path.display()))
    }

    /// Loads works into `store` and objects into `spoke`.
    pub fn seed(self, store: &InMemoryWorkStore, spoke: &InMemorySpokeClient) -> Result<()> {
        let objects = spoke
            .apply_all(self.objects)
            .context("Invalid spoke object in fixtures")?;
        let works = self.works.len();
        for work in self.works {
            store.insert(work);
        }
        info!(works, objects, "Fixtures seeded");
        Ok(())
    }
}
