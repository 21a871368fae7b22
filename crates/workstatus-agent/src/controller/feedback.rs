use workstatus_core::{CONDITION_STATUS_FEEDBACK_SYNCED, Condition, ConditionStatus};
use workstatus_feedback::FeedbackOutcome;

pub const REASON_FEEDBACK_SYNC_FAILED: &str = "StatusFeedbackSyncFailed";
pub const REASON_NO_FEEDBACK_SYNCED: &str = "NoStatusFeedbackSynced";
pub const REASON_FEEDBACK_SYNCED: &str = "StatusFeedbackSynced";

/// Condition describing how extraction went for one manifest.
///
/// Finding no value at all is still a success; only errors turn it False.
pub fn feedback_condition(outcome: &FeedbackOutcome) -> Condition {
    if let Some(err) = &outcome.error {
        return Condition::new(
            CONDITION_STATUS_FEEDBACK_SYNCED,
            ConditionStatus::False,
            REASON_FEEDBACK_SYNC_FAILED,
            format!("Sync status feedback failed with error {err}"),
        );
    }

    let reason = if outcome.values.is_empty() {
        REASON_NO_FEEDBACK_SYNCED
    } else {
        REASON_FEEDBACK_SYNCED
    };
    Condition::new(
        CONDITION_STATUS_FEEDBACK_SYNCED,
        ConditionStatus::True,
        reason,
        "",
    )
}
