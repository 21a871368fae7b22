//! Wires the syncer into its two drivers and runs them in the background.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};
use workstatus_storage::{DynSpokeClient, DynWorkStore, WorkEvent};

use crate::config::SyncConfig;
use crate::controller::{Reconciler, StatusSyncLoop, WorkSyncer};

/// Status feedback agent for one hub.
#[derive(Debug)]
pub struct Agent {
    syncer: Arc<WorkSyncer>,
    config: SyncConfig,
}

impl Agent {
    pub fn new(config: &SyncConfig, store: DynWorkStore, spoke: DynSpokeClient) -> Self {
        Self::with_syncer(
            config,
            WorkSyncer::new(store, spoke, config.call_timeout()),
        )
    }

    pub fn with_syncer(config: &SyncConfig, syncer: WorkSyncer) -> Self {
        Self {
            syncer: Arc::new(syncer),
            config: config.clone(),
        }
    }

    pub fn syncer(&self) -> &Arc<WorkSyncer> {
        &self.syncer
    }

    pub fn sync_loop(&self) -> StatusSyncLoop {
        StatusSyncLoop::new(self.syncer.clone(), self.config.interval())
            .with_concurrency(self.config.concurrency)
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.syncer.clone())
    }

    /// Spawns the periodic loop and, when edge triggering is enabled and
    /// `events` is given, the event-driven reconciler.
    pub fn start(
        self,
        events: Option<broadcast::Receiver<WorkEvent>>,
        shutdown: watch::Receiver<bool>,
    ) -> AgentHandle {
        let mut tasks = vec![tokio::spawn(self.sync_loop().run(shutdown.clone()))];

        match events {
            Some(events) if self.config.edge_triggered => {
                tasks.push(tokio::spawn(self.reconciler().run(events, shutdown)));
            }
            _ => info!("Edge-triggered reconciling disabled"),
        }

        AgentHandle { tasks }
    }
}

/// Background tasks of a started [`Agent`].
#[derive(Debug)]
pub struct AgentHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl AgentHandle {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every task to stop. Signal shutdown first.
    pub async fn join(self) {
        for result in futures_util::future::join_all(self.tasks).await {
            if let Err(e) = result {
                error!(error = %e, "Agent task failed");
            }
        }
    }
}
