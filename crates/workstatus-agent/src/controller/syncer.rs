//! Rebuilds and conditionally writes the status of one work.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, trace};
use workstatus_core::{
    CONDITION_STATUS_FEEDBACK_SYNCED, Condition, ManifestCondition, ManifestResourceMeta, Work,
    WorkId, WorkStatus, find_condition, set_condition,
};
use workstatus_feedback::StatusReader;
use workstatus_storage::{DynSpokeClient, DynWorkStore, StorageError};

use super::aggregate::aggregate_manifest_conditions;
use super::available::{ResourceObservation, build_available_condition};
use super::feedback::feedback_condition;
use super::tracker::{Fingerprint, Observation, StopSyncTracker};
use crate::error::Result;

/// What happened to one work during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The rebuilt status equals the stored one; nothing was written.
    Unchanged,
    /// The status was replaced.
    Updated { resource_version: u64 },
    /// The work changed since it was read; the write was dropped.
    Conflict,
}

/// A rebuilt status plus the stop-sync observations made while building it.
#[derive(Debug)]
struct Candidate {
    status: WorkStatus,
    observations: Vec<Observation>,
}

/// Shared per-work pipeline used by both the periodic sweep and the
/// event-driven reconciler.
pub struct WorkSyncer {
    store: DynWorkStore,
    spoke: DynSpokeClient,
    reader: StatusReader,
    tracker: Arc<StopSyncTracker>,
    call_timeout: Duration,
}

impl std::fmt::Debug for WorkSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkSyncer")
            .field("call_timeout", &self.call_timeout)
            .field("tracked", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl WorkSyncer {
    pub fn new(store: DynWorkStore, spoke: DynSpokeClient, call_timeout: Duration) -> Self {
        Self {
            store,
            spoke,
            reader: StatusReader::new(),
            tracker: Arc::new(StopSyncTracker::new()),
            call_timeout,
        }
    }

    /// Use a reader with a different common fields table.
    pub fn with_reader(mut self, reader: StatusReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<StopSyncTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn tracker(&self) -> &Arc<StopSyncTracker> {
        &self.tracker
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub async fn get_work(&self, id: &WorkId) -> Result<Option<Work>> {
        match tokio::time::timeout(self.call_timeout, self.store.get(id)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StorageError::timeout(self.call_timeout).into()),
        }
    }

    pub async fn list_works(&self) -> Result<Vec<Work>> {
        match tokio::time::timeout(self.call_timeout, self.store.list()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StorageError::timeout(self.call_timeout).into()),
        }
    }

    /// Computes the status `work` should have, starting from its stored status.
    ///
    /// Resources are fetched concurrently. Every manifest gets an `Available`
    /// condition; values are extracted only for available manifests matched by
    /// a config, and manifests skipped this pass keep what they last reported.
    /// Stop-sync counters are left untouched.
    pub async fn build_status(&self, work: &Work) -> WorkStatus {
        self.build(work).await.status
    }

    async fn build(&self, work: &Work) -> Candidate {
        let id = work.id();
        let generation = work.metadata.generation;
        let spoke = self.spoke.as_ref();
        let timeout = self.call_timeout;

        let observations = join_all(work.spec.workload.iter().enumerate().map(
            move |(ordinal, manifest)| async move {
                match manifest.resource_meta(ordinal) {
                    Ok(meta) => {
                        let observation = build_available_condition(spoke, Ok(&meta), timeout).await;
                        (meta, observation)
                    }
                    Err(err) => {
                        let observation = build_available_condition(spoke, Err(err), timeout).await;
                        (ManifestResourceMeta::unresolved(ordinal), observation)
                    }
                }
            },
        ))
        .await;

        self.tracker.retain_ordinals(&id, work.spec.workload.len());

        let mut pending = Vec::new();
        let manifests: Vec<ManifestCondition> = observations
            .into_iter()
            .map(|(meta, observation)| {
                let (entry, seen) = self.manifest_status(work, &id, meta, observation);
                pending.extend(seen);
                entry
            })
            .collect();

        let mut conditions = work.status.conditions.clone();
        set_condition(
            &mut conditions,
            aggregate_manifest_conditions(generation, &manifests),
        );

        Candidate {
            status: WorkStatus {
                conditions,
                manifests,
            },
            observations: pending,
        }
    }

    fn manifest_status(
        &self,
        work: &Work,
        id: &WorkId,
        meta: ManifestResourceMeta,
        observation: ResourceObservation,
    ) -> (ManifestCondition, Option<Observation>) {
        let generation = work.metadata.generation;
        let previous = work
            .status
            .manifests
            .iter()
            .find(|m| m.resource_meta == meta);
        let mut entry = previous
            .cloned()
            .unwrap_or_else(|| ManifestCondition::new(meta.clone()));

        set_condition(
            &mut entry.conditions,
            observation.condition.with_observed_generation(generation),
        );

        let (Some(object), Some(config)) = (observation.object, work.spec.config_for(&meta)) else {
            return (entry, None);
        };

        let ordinal = meta.ordinal;
        let threshold = config.stop_sync_threshold;
        let fingerprint = Fingerprint::of(&meta, config);
        if previous.is_some() && !self.tracker.should_extract(id, ordinal, fingerprint, threshold) {
            trace!(work = %id, ordinal, threshold, "stop-sync threshold reached, skipping extraction");
            return (entry, None);
        }

        let outcome = self
            .reader
            .values_by_rules(&object, &meta.gvk(), &config.feedback_rules);
        if let Some(err) = &outcome.error {
            debug!(work = %id, ordinal, error = %err, "status feedback extracted with errors");
        }

        let condition = feedback_condition(&outcome);
        let seen = (threshold > 0).then(|| Observation {
            ordinal,
            fingerprint,
            repeated: previous.is_some_and(|stored| {
                stored.status_feedback.values == outcome.values
                    && same_feedback_condition(&stored.conditions, &condition)
            }),
        });

        set_condition(
            &mut entry.conditions,
            condition.with_observed_generation(generation),
        );
        entry.status_feedback.values = outcome.values;
        (entry, seen)
    }

    /// Rebuilds the status of `work` and writes it if it changed.
    ///
    /// The write is conditional on the resource version `work` was read at. A
    /// conflict is reported as [`SyncOutcome::Conflict`], not as an error.
    pub async fn sync(&self, work: &Work) -> Result<SyncOutcome> {
        let id = work.id();
        let Candidate {
            status,
            observations,
        } = self.build(work).await;

        if status == work.status {
            trace!(work = %id, "status unchanged");
            self.tracker.commit(&id, &observations);
            return Ok(SyncOutcome::Unchanged);
        }

        let expected = work.metadata.resource_version;
        let write = self.store.update_status(&id, expected, status);
        match tokio::time::timeout(self.call_timeout, write).await {
            Ok(Ok(resource_version)) => {
                debug!(work = %id, resource_version, "status updated");
                self.tracker.commit(&id, &observations);
                Ok(SyncOutcome::Updated { resource_version })
            }
            Ok(Err(err)) if err.is_version_conflict() => {
                debug!(work = %id, error = %err, "status update conflicted, deferring to next pass");
                Ok(SyncOutcome::Conflict)
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(StorageError::timeout(self.call_timeout).into()),
        }
    }
}

/// Whether the stored `StatusFeedbackSynced` condition reports the same
/// result as `condition`. Transition time and generation are ignored.
fn same_feedback_condition(stored: &[Condition], condition: &Condition) -> bool {
    find_condition(stored, CONDITION_STATUS_FEEDBACK_SYNCED).is_some_and(|c| {
        c.status == condition.status
            && c.reason == condition.reason
            && c.message == condition.message
    })
}
