//! # workstatus-storage
//!
//! Boundary traits between the status reconciler and the systems it talks to.
//!
//! - [`WorkStore`]: reads work records on the hub and writes their status
//!   with optimistic concurrency
//! - [`SpokeClient`]: fetches live resources from the spoke cluster
//! - [`WorkEventBroadcaster`]: change notifications for event-driven reconciling
//!
//! This crate contains no implementations. An in-memory backend lives in
//! `workstatus-db-memory`.

mod error;
pub mod events;
mod traits;

pub use error::{ErrorCategory, SpokeError, StorageError};
pub use events::{WorkEvent, WorkEventBroadcaster, WorkEventKind};
pub use traits::{SpokeClient, WorkStore};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared work store.
pub type DynWorkStore = std::sync::Arc<dyn WorkStore>;

/// Type alias for a shared spoke client.
pub type DynSpokeClient = std::sync::Arc<dyn SpokeClient>;
