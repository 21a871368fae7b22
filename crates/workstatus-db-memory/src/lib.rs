//! In-memory collaborators for workstatus.
//!
//! [`InMemoryWorkStore`] implements the hub-side [`WorkStore`] with
//! resource-version checked status writes, and [`InMemorySpokeClient`] serves
//! live objects for the [`SpokeClient`] boundary. Both support fault injection
//! for tests and the local agent mode.
//!
//! # Example
//!
//! ```ignore
//! use workstatus_db_memory::{InMemorySpokeClient, InMemoryWorkStore};
//! use workstatus_storage::WorkStore;
//!
//! let store = InMemoryWorkStore::new();
//! let stored = store.insert(Work::new(WorkId::new("cluster1", "web"), spec));
//! let works = store.list().await?;
//! ```

mod spoke;
mod work_store;

pub use spoke::{InMemorySpokeClient, ObjectKey};
pub use work_store::InMemoryWorkStore;
pub use workstatus_storage::{SpokeClient, SpokeError, StorageError, WorkStore};
