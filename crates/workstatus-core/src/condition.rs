//! Status conditions.
//!
//! A condition set holds at most one condition per type. Setting a condition
//! whose type is already present replaces it in place; the transition time is
//! only refreshed when the status actually changes, so re-observing the same
//! state produces a structurally identical set.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Condition type reporting whether a resource (or every resource of a work) exists.
pub const CONDITION_AVAILABLE: &str = "Available";

/// Condition type reporting the outcome of status feedback extraction.
pub const CONDITION_STATUS_FEEDBACK_SYNCED: &str = "StatusFeedbackSynced";

/// Tri-state condition status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A named health signal with reason and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_transition_time: OffsetDateTime,
}

impl Condition {
    /// Creates a condition without a transition time; [`set_condition`] stamps it.
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            observed_generation: 0,
            last_transition_time: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[must_use]
    pub fn with_observed_generation(mut self, generation: i64) -> Self {
        self.observed_generation = generation;
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

fn now_seconds() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

/// Sets `condition` in `conditions`, replacing any existing condition of the same type.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) {
    let stamp = |c: &Condition| {
        if c.last_transition_time == OffsetDateTime::UNIX_EPOCH {
            now_seconds()
        } else {
            c.last_transition_time
        }
    };

    match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) => {
            if existing.status != condition.status {
                existing.status = condition.status;
                existing.last_transition_time = stamp(&condition);
            }
            existing.reason = condition.reason;
            existing.message = condition.message;
            existing.observed_generation = condition.observed_generation;
        }
        None => {
            condition.last_transition_time = stamp(&condition);
            conditions.push(condition);
        }
    }
}

pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

pub fn is_condition_true(conditions: &[Condition], type_: &str) -> bool {
    find_condition(conditions, type_).is_some_and(Condition::is_true)
}
