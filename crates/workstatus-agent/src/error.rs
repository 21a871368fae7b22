use workstatus_core::CoreError;
use workstatus_storage::{SpokeError, StorageError};

/// Errors raised while reconciling one work.
///
/// Per-manifest failures never surface here: they are reported through the
/// manifest's conditions. What remains are failures that stop the whole
/// record, or the whole pass when listing fails.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Spoke(#[from] SpokeError),

    #[error(transparent)]
    Manifest(#[from] CoreError),
}

impl ReconcileError {
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_version_conflict())
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_not_found(),
            Self::Spoke(e) => e.is_not_found(),
            Self::Manifest(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
