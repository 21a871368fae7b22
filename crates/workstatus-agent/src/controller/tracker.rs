//! Stop-sync bookkeeping.
//!
//! A manifest configured with a non-zero `stop_sync_threshold` stops being
//! extracted once that many consecutive persisted passes extracted exactly
//! the values and extraction condition already stored for it. Changing the
//! manifest's resource identity or its rules starts counting again.
//!
//! Counting is two-phase: a pass produces [`Observation`]s while building the
//! candidate status and the syncer commits them only after the status was
//! written or found unchanged in the store.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use workstatus_core::{ManifestConfig, ManifestResourceMeta, WorkId};

/// Hash of everything that restarts counting when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(resource: &ManifestResourceMeta, config: &ManifestConfig) -> Self {
        let mut hasher = DefaultHasher::new();
        resource.hash(&mut hasher);
        config.feedback_rules.hash(&mut hasher);
        config.stop_sync_threshold.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// One extraction awaiting commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub ordinal: usize,
    pub fingerprint: Fingerprint,
    /// The extraction matched the entry stored before the pass.
    pub repeated: bool,
}

#[derive(Debug)]
struct Slot {
    fingerprint: Fingerprint,
    unchanged: u32,
}

/// Tracks consecutive persisted repeats per (work, manifest ordinal).
///
/// Shared by the periodic sweep and the event-driven reconciler.
#[derive(Debug, Default)]
pub struct StopSyncTracker {
    entries: DashMap<(WorkId, usize), Slot>,
}

impl StopSyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the manifest at `ordinal` should be extracted this pass.
    pub fn should_extract(
        &self,
        work: &WorkId,
        ordinal: usize,
        fingerprint: Fingerprint,
        threshold: u32,
    ) -> bool {
        if threshold == 0 {
            return true;
        }
        match self.entries.get(&(work.clone(), ordinal)) {
            Some(entry) if entry.fingerprint == fingerprint => entry.unchanged < threshold,
            _ => true,
        }
    }

    /// Commits the observations of a pass whose status reached the store.
    pub fn commit(&self, work: &WorkId, observations: &[Observation]) {
        for observation in observations {
            self.record(
                work,
                observation.ordinal,
                observation.fingerprint,
                observation.repeated,
            );
        }
    }

    /// Records one persisted extraction, returning the number of consecutive
    /// passes that repeated the stored result.
    pub fn record(
        &self,
        work: &WorkId,
        ordinal: usize,
        fingerprint: Fingerprint,
        repeated: bool,
    ) -> u32 {
        match self.entries.entry((work.clone(), ordinal)) {
            Entry::Vacant(vacant) => {
                vacant.insert(Slot {
                    fingerprint,
                    unchanged: 0,
                });
                0
            }
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if slot.fingerprint == fingerprint && repeated {
                    slot.unchanged = slot.unchanged.saturating_add(1);
                } else {
                    slot.fingerprint = fingerprint;
                    slot.unchanged = 0;
                }
                slot.unchanged
            }
        }
    }

    /// Drops state for manifests past the end of the work's workload.
    pub fn retain_ordinals(&self, work: &WorkId, len: usize) {
        self.entries
            .retain(|(id, ordinal), _| id != work || *ordinal < len);
    }

    /// Drops all state for a work.
    pub fn forget(&self, work: &WorkId) {
        self.entries.retain(|(id, _), _| id != work);
    }

    /// Drops state for every work not in `live`.
    pub fn retain_works<'a>(&self, live: impl IntoIterator<Item = &'a WorkId>) {
        let live: std::collections::HashSet<&WorkId> = live.into_iter().collect();
        self.entries.retain(|(id, _), _| live.contains(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
