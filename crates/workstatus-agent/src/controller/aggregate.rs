//! Work-level availability.

use workstatus_core::{CONDITION_AVAILABLE, Condition, ConditionStatus, ManifestCondition};

pub const REASON_RESOURCES_NOT_AVAILABLE: &str = "ResourcesNotAvailable";
pub const REASON_RESOURCES_STATUS_UNKNOWN: &str = "ResourcesStatusUnknown";
pub const REASON_RESOURCES_AVAILABLE: &str = "ResourcesAvailable";

/// Folds every manifest's `Available` condition into one condition for the work.
///
/// Any False wins over any Unknown, which wins over all True. A work with no
/// True manifest at all (including an empty one) is Unknown.
pub fn aggregate_manifest_conditions(generation: i64, manifests: &[ManifestCondition]) -> Condition {
    let (mut available, mut unavailable, mut unknown) = (0usize, 0usize, 0usize);
    for condition in manifests
        .iter()
        .flat_map(|m| &m.conditions)
        .filter(|c| c.type_ == CONDITION_AVAILABLE)
    {
        match condition.status {
            ConditionStatus::True => available += 1,
            ConditionStatus::False => unavailable += 1,
            ConditionStatus::Unknown => unknown += 1,
        }
    }
    let total = manifests.len();

    let condition = if unavailable > 0 {
        Condition::new(
            CONDITION_AVAILABLE,
            ConditionStatus::False,
            REASON_RESOURCES_NOT_AVAILABLE,
            format!("{unavailable} of {total} resources are not available"),
        )
    } else if unknown > 0 {
        Condition::new(
            CONDITION_AVAILABLE,
            ConditionStatus::Unknown,
            REASON_RESOURCES_STATUS_UNKNOWN,
            format!("{unknown} of {total} resources have unknown status"),
        )
    } else if available == 0 {
        Condition::new(
            CONDITION_AVAILABLE,
            ConditionStatus::Unknown,
            REASON_RESOURCES_STATUS_UNKNOWN,
            "cannot get any available resource",
        )
    } else {
        Condition::new(
            CONDITION_AVAILABLE,
            ConditionStatus::True,
            REASON_RESOURCES_AVAILABLE,
            "All resources are available",
        )
    };

    condition.with_observed_generation(generation)
}
