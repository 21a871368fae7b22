//! Work change notifications.
//!
//! Stores publish a [`WorkEvent`] after every successful mutation. The
//! event-driven reconciler subscribes and processes only the affected work.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use workstatus_core::WorkId;

/// Events beyond this limit are dropped for slow receivers.
const DEFAULT_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkEventKind {
    Created,
    SpecUpdated,
    StatusUpdated,
    Deleted,
}

impl WorkEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::SpecUpdated => "spec_updated",
            Self::StatusUpdated => "status_updated",
            Self::Deleted => "deleted",
        }
    }

    /// Whether the change can alter the desired status of the work.
    pub fn affects_desired_state(&self) -> bool {
        matches!(self, Self::Created | Self::SpecUpdated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkEvent {
    pub id: WorkId,
    pub kind: WorkEventKind,
    pub resource_version: u64,
}

impl WorkEvent {
    pub fn new(id: WorkId, kind: WorkEventKind, resource_version: u64) -> Self {
        Self {
            id,
            kind,
            resource_version,
        }
    }
}

/// Multi-consumer broadcaster for [`WorkEvent`]s.
#[derive(Debug, Clone)]
pub struct WorkEventBroadcaster {
    sender: broadcast::Sender<WorkEvent>,
}

impl WorkEventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Sends an event, returning the number of subscribers that received it.
    pub fn send(&self, event: WorkEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Subscribe to events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WorkEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
