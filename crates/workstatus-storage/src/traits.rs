//! Collaborator traits consumed by the reconciler.

use async_trait::async_trait;
use serde_json::Value;
use workstatus_core::{ManifestResourceMeta, Work, WorkId, WorkStatus};

use crate::error::{SpokeError, StorageError};

/// The persisted-state boundary for work records on the hub.
///
/// Implementations must be thread-safe. Both the periodic sweep and the
/// event-driven path call into the same store concurrently; ordering between
/// them is enforced only by [`WorkStore::update_status`].
///
/// # Example
///
/// ```ignore
/// use workstatus_storage::{StorageError, WorkStore};
///
/// async fn bump(store: &dyn WorkStore, id: &WorkId) -> Result<(), StorageError> {
///     let work = store.get(id).await?.ok_or_else(|| StorageError::not_found(id))?;
///     store
///         .update_status(id, work.metadata.resource_version, work.status.clone())
///         .await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait WorkStore: Send + Sync {
    /// Reads a work by id.
    ///
    /// Returns `None` if the work does not exist.
    async fn get(&self, id: &WorkId) -> Result<Option<Work>, StorageError>;

    /// Lists every work.
    async fn list(&self) -> Result<Vec<Work>, StorageError>;

    /// Replaces the status of a work if its resource version still equals
    /// `expected_version`, returning the new resource version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the work does not exist.
    /// Returns `StorageError::VersionConflict` if the record changed since it was read.
    async fn update_status(
        &self,
        id: &WorkId,
        expected_version: u64,
        status: WorkStatus,
    ) -> Result<u64, StorageError>;
}

/// Read access to live resources on the spoke.
#[async_trait]
pub trait SpokeClient: Send + Sync {
    /// Fetches the live object identified by `resource`.
    ///
    /// # Errors
    ///
    /// Returns `SpokeError::NotFound` when the object does not exist, which
    /// callers treat differently from every other failure.
    async fn get(&self, resource: &ManifestResourceMeta) -> Result<Value, SpokeError>;
}
