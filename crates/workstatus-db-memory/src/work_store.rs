use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use workstatus_core::{Work, WorkId, WorkSpec, WorkStatus};
use workstatus_storage::{
    StorageError, WorkEvent, WorkEventBroadcaster, WorkEventKind, WorkStore,
};

/// In-memory work store.
///
/// Every stored change draws a fresh resource version from one store-wide
/// counter, so versions are unique across works and strictly increasing.
/// Status writes compare and set under the entry's shard lock.
#[derive(Debug)]
pub struct InMemoryWorkStore {
    works: DashMap<WorkId, Work>,
    version_counter: AtomicU64,
    events: WorkEventBroadcaster,
    unavailable: AtomicBool,
}

impl Default for InMemoryWorkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWorkStore {
    pub fn new() -> Self {
        Self::with_broadcaster(WorkEventBroadcaster::new())
    }

    pub fn with_broadcaster(events: WorkEventBroadcaster) -> Self {
        Self {
            works: DashMap::new(),
            version_counter: AtomicU64::new(1),
            events,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Broadcaster notified after every successful mutation.
    pub fn events(&self) -> &WorkEventBroadcaster {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }

    /// Makes every subsequent call fail with a connection error until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn next_version(&self) -> u64 {
        self.version_counter.fetch_add(1, Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::connection_error("work store unavailable"))
        } else {
            Ok(())
        }
    }

    fn emit(&self, id: WorkId, kind: WorkEventKind, resource_version: u64) {
        let subscribers = self
            .events
            .send(WorkEvent::new(id.clone(), kind, resource_version));
        debug!(work = %id, kind = kind.as_str(), subscribers, "emitted work event");
    }

    /// Stores `work`, replacing any existing record with the same id.
    ///
    /// The stored copy gets a fresh resource version and a generation of at
    /// least 1.
    pub fn insert(&self, mut work: Work) -> Work {
        work.metadata.resource_version = self.next_version();
        work.metadata.generation = work.metadata.generation.max(1);
        let id = work.id();
        self.works.insert(id.clone(), work.clone());
        self.emit(id, WorkEventKind::Created, work.metadata.resource_version);
        work
    }

    /// Replaces the spec of a work and bumps its generation.
    pub fn update_spec(&self, id: &WorkId, spec: WorkSpec) -> Result<Work, StorageError> {
        self.check_available()?;
        let updated = {
            let mut entry = self
                .works
                .get_mut(id)
                .ok_or_else(|| StorageError::not_found(id))?;
            entry.spec = spec;
            entry.metadata.generation += 1;
            entry.metadata.resource_version = self.next_version();
            entry.clone()
        };
        self.emit(
            id.clone(),
            WorkEventKind::SpecUpdated,
            updated.metadata.resource_version,
        );
        Ok(updated)
    }

    pub fn delete(&self, id: &WorkId) -> Result<Work, StorageError> {
        self.check_available()?;
        let (_, removed) = self
            .works
            .remove(id)
            .ok_or_else(|| StorageError::not_found(id))?;
        self.emit(
            id.clone(),
            WorkEventKind::Deleted,
            removed.metadata.resource_version,
        );
        Ok(removed)
    }
}

#[async_trait]
impl WorkStore for InMemoryWorkStore {
    async fn get(&self, id: &WorkId) -> Result<Option<Work>, StorageError> {
        self.check_available()?;
        Ok(self.works.get(id).map(|entry| entry.value().clone()))
    }

    async fn list(&self) -> Result<Vec<Work>, StorageError> {
        self.check_available()?;
        let mut works: Vec<Work> = self.works.iter().map(|entry| entry.value().clone()).collect();
        works.sort_by_key(Work::id);
        Ok(works)
    }

    async fn update_status(
        &self,
        id: &WorkId,
        expected_version: u64,
        status: WorkStatus,
    ) -> Result<u64, StorageError> {
        self.check_available()?;
        let version = {
            let mut entry = self
                .works
                .get_mut(id)
                .ok_or_else(|| StorageError::not_found(id))?;
            let actual = entry.metadata.resource_version;
            if actual != expected_version {
                return Err(StorageError::version_conflict(expected_version, actual));
            }
            entry.status = status;
            entry.metadata.resource_version = self.next_version();
            entry.metadata.resource_version
        };
        self.emit(id.clone(), WorkEventKind::StatusUpdated, version);
        Ok(version)
    }
}
