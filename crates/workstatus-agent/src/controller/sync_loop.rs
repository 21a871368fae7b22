//! Periodic sweep over every work.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, stream};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::syncer::{SyncOutcome, WorkSyncer};
use crate::error::Result;

/// Counts of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub works: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub conflicts: usize,
    pub failed: usize,
}

impl PassSummary {
    fn add(&mut self, result: &Result<SyncOutcome>) {
        match result {
            Ok(SyncOutcome::Updated { .. }) => self.updated += 1,
            Ok(SyncOutcome::Unchanged) => self.unchanged += 1,
            Ok(SyncOutcome::Conflict) => self.conflicts += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Level-triggered status sync: every interval, list all works and sync each.
#[derive(Debug, Clone)]
pub struct StatusSyncLoop {
    syncer: Arc<WorkSyncer>,
    interval: Duration,
    concurrency: usize,
}

impl StatusSyncLoop {
    pub fn new(syncer: Arc<WorkSyncer>, interval: Duration) -> Self {
        Self {
            syncer,
            interval,
            concurrency: 1,
        }
    }

    /// Number of works synced in parallel within one pass.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs one pass over every work.
    ///
    /// A listing failure fails the whole pass. A failure syncing one work is
    /// logged and counted; the remaining works are still synced.
    pub async fn sync_all(&self) -> Result<PassSummary> {
        let works = self.syncer.list_works().await?;
        let live: Vec<_> = works.iter().map(|w| w.id()).collect();
        self.syncer.tracker().retain_works(&live);

        let mut summary = PassSummary {
            works: works.len(),
            ..Default::default()
        };
        if works.is_empty() {
            debug!("no work found");
            return Ok(summary);
        }

        let syncer = &self.syncer;
        let mut results = stream::iter(works)
            .map(|work| async move {
                let result = syncer.sync(&work).await;
                if let Err(err) = &result {
                    warn!(work = %work.id(), error = %err, "unable to sync work");
                }
                result
            })
            .buffer_unordered(self.concurrency);

        while let Some(result) = results.next().await {
            summary.add(&result);
        }

        Ok(summary)
    }

    /// Runs passes until `shutdown` flips to true. An in-flight pass is
    /// abandoned on shutdown; status writes are atomic so nothing is left
    /// half-written. Other values published on `shutdown` are ignored.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            concurrency = self.concurrency,
            "Status sync loop started"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = stop_requested(&mut shutdown) => {
                    info!("Status sync loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;

                        () = stop_requested(&mut shutdown) => {
                            info!("Status sync loop shutting down during a pass");
                            break;
                        }
                        pass = self.sync_all() => match pass {
                            Ok(summary) => info!(
                                works = summary.works,
                                updated = summary.updated,
                                unchanged = summary.unchanged,
                                conflicts = summary.conflicts,
                                failed = summary.failed,
                                "Status sync pass finished"
                            ),
                            Err(err) => error!(error = %err, "unable to list works, skipping pass"),
                        },
                    }
                }
            }
        }
    }
}

/// Resolves once `shutdown` holds true or its sender is gone.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
