//! Event-driven reconciling of single works.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use workstatus_core::WorkId;
use workstatus_storage::{WorkEvent, WorkEventKind};

use super::syncer::{SyncOutcome, WorkSyncer};
use crate::error::Result;

/// Reconciles one work at a time, on demand.
///
/// Periodic re-checks belong to the level-triggered
/// [`StatusSyncLoop`](super::StatusSyncLoop); this driver only reacts.
#[derive(Debug, Clone)]
pub struct Reconciler {
    syncer: Arc<WorkSyncer>,
}

impl Reconciler {
    pub fn new(syncer: Arc<WorkSyncer>) -> Self {
        Self { syncer }
    }

    /// Reads the work and syncs its status. A missing work is not an error
    /// and yields `None`.
    pub async fn reconcile(&self, id: &WorkId) -> Result<Option<SyncOutcome>> {
        let Some(work) = self.syncer.get_work(id).await? else {
            debug!(work = %id, "work not found, nothing to reconcile");
            self.syncer.tracker().forget(id);
            return Ok(None);
        };

        self.syncer.sync(&work).await.map(Some)
    }

    /// Reconciles every work whose spec changes, until shutdown or until the
    /// event channel closes.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<WorkEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("Event-driven reconciler started");

        loop {
            tokio::select! {
                biased;

                result = shutdown.changed() => {
                    match result {
                        Ok(()) if *shutdown.borrow() => {
                            info!("Event-driven reconciler shutting down");
                            break;
                        }
                        Ok(()) => {}
                        Err(_) => {
                            info!("Event-driven reconciler shutdown channel closed");
                            break;
                        }
                    }
                }
                received = events.recv() => {
                    match received {
                        Ok(event) => self.handle(event).await,
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(missed, "Reconciler lagged, missed work events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Work event channel closed, stopping reconciler");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle(&self, event: WorkEvent) {
        match event.kind {
            WorkEventKind::Deleted => {
                self.syncer.tracker().forget(&event.id);
                return;
            }
            kind if !kind.affects_desired_state() => return,
            _ => {}
        }

        match self.reconcile(&event.id).await {
            Ok(outcome) => {
                debug!(work = %event.id, kind = event.kind.as_str(), ?outcome, "reconciled");
            }
            Err(err) => {
                warn!(work = %event.id, error = %err, "failed to reconcile work");
            }
        }
    }
}
