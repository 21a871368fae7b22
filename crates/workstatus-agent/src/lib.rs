//! Status feedback agent.
//!
//! Keeps the status of every work record on the hub in line with the live
//! state of its resources on the spoke. For each work the agent fetches every
//! manifest's resource, derives per-resource `Available` and
//! `StatusFeedbackSynced` conditions, extracts the configured feedback values,
//! folds availability into a work-level condition and writes the result back
//! under optimistic concurrency.
//!
//! Two drivers share one [`controller::WorkSyncer`]: a periodic
//! [`controller::StatusSyncLoop`] over all works and an event-driven
//! [`controller::Reconciler`] for works whose spec just changed.

pub mod agent;
pub mod config;
pub mod controller;
pub mod error;
pub mod fixtures;
pub mod observability;

pub use agent::{Agent, AgentHandle};
pub use config::{AppConfig, FixturesConfig, LoggingConfig, SyncConfig};
pub use controller::{
    PassSummary, Reconciler, StatusSyncLoop, StopSyncTracker, SyncOutcome,
    WorkSyncer,
};
pub use error::{ReconcileError, Result};
pub use fixtures::Fixtures;
pub use observability::init_tracing;
