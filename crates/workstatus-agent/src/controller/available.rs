//! Availability of a single manifest's live resource.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use workstatus_core::{
    CONDITION_AVAILABLE, Condition, ConditionStatus, CoreError, ManifestResourceMeta,
};
use workstatus_storage::{SpokeClient, SpokeError};

use crate::error::ReconcileError;

pub const REASON_RESOURCE_AVAILABLE: &str = "ResourceAvailable";
pub const REASON_RESOURCE_NOT_AVAILABLE: &str = "ResourceNotAvailable";
pub const REASON_FETCHING_RESOURCE_FAILED: &str = "FetchingResourceFailed";
pub const REASON_INCOMPLETE_RESOURCE_META: &str = "IncompletedResourceMeta";

/// Result of looking up one manifest's resource on the spoke.
#[derive(Debug)]
pub struct ResourceObservation {
    /// The live object, present only when availability is True.
    pub object: Option<Value>,
    /// The `Available` condition for the manifest.
    pub condition: Condition,
    /// Why the object is missing, if it is.
    pub error: Option<ReconcileError>,
}

impl ResourceObservation {
    fn available(object: Value) -> Self {
        Self {
            object: Some(object),
            condition: Condition::new(
                CONDITION_AVAILABLE,
                ConditionStatus::True,
                REASON_RESOURCE_AVAILABLE,
                "Resource is available",
            ),
            error: None,
        }
    }

    fn unavailable(condition: Condition, error: ReconcileError) -> Self {
        Self {
            object: None,
            condition,
            error: Some(error),
        }
    }

    pub fn is_available(&self) -> bool {
        self.object.is_some()
    }
}

fn incomplete_meta(error: ReconcileError) -> ResourceObservation {
    ResourceObservation::unavailable(
        Condition::new(
            CONDITION_AVAILABLE,
            ConditionStatus::Unknown,
            REASON_INCOMPLETE_RESOURCE_META,
            "Resource meta is incompleted",
        ),
        error,
    )
}

/// Fetches the resource behind a manifest and derives its `Available` condition.
///
/// `resource` is the outcome of decoding the manifest's coordinates. A decode
/// failure, or a spoke that does not serve the kind, yields Unknown without
/// any further work. A missing object yields False; every other fetch failure,
/// including hitting `timeout`, yields Unknown.
pub async fn build_available_condition(
    spoke: &dyn SpokeClient,
    resource: Result<&ManifestResourceMeta, CoreError>,
    timeout: Duration,
) -> ResourceObservation {
    let meta = match resource {
        Ok(meta) => meta,
        Err(err) => {
            warn!(error = %err, "cannot resolve manifest resource");
            return incomplete_meta(err.into());
        }
    };

    let fetched = match tokio::time::timeout(timeout, spoke.get(meta)).await {
        Ok(result) => result,
        Err(_) => Err(SpokeError::timeout(meta, timeout)),
    };

    match fetched {
        Ok(object) => {
            debug!(resource = %meta, "resource is available");
            ResourceObservation::available(object)
        }
        Err(err @ SpokeError::NoResourceMapping { .. }) => {
            warn!(resource = %meta, error = %err, "cannot map manifest resource");
            incomplete_meta(err.into())
        }
        Err(err) if err.is_not_found() => {
            debug!(resource = %meta, "resource not found");
            ResourceObservation::unavailable(
                Condition::new(
                    CONDITION_AVAILABLE,
                    ConditionStatus::False,
                    REASON_RESOURCE_NOT_AVAILABLE,
                    "Resource is not available",
                ),
                err.into(),
            )
        }
        Err(err) => {
            warn!(resource = %meta, error = %err, category = %err.category(), "failed to fetch resource");
            ResourceObservation::unavailable(
                Condition::new(
                    CONDITION_AVAILABLE,
                    ConditionStatus::Unknown,
                    REASON_FETCHING_RESOURCE_FAILED,
                    format!("Failed to fetch resource: {err}"),
                ),
                err.into(),
            )
        }
    }
}
