//! Status feedback controllers
//!
//! ```text
//! WorkStore ──list (interval)──► StatusSyncLoop ─┐
//!          └─WorkEvent──────────► Reconciler ────┤
//!                                                ▼
//!                                           WorkSyncer
//!                         ┌─────────────────────┼─────────────────────┐
//!                  build_available_condition  StatusReader   aggregate_manifest_conditions
//!                     (SpokeClient::get)     (+ StopSyncTracker)
//!                                                ▼
//!                            WorkStore::update_status (resource_version CAS)
//! ```

pub mod aggregate;
pub mod available;
pub mod feedback;
pub mod reconciler;
pub mod sync_loop;
pub mod syncer;
pub mod tracker;

pub use aggregate::aggregate_manifest_conditions;
pub use available::{ResourceObservation, build_available_condition};
pub use feedback::feedback_condition;
pub use reconciler::Reconciler;
pub use sync_loop::{PassSummary, StatusSyncLoop};
pub use syncer::{SyncOutcome, WorkSyncer};
pub use tracker::{Fingerprint, Observation, StopSyncTracker};
