pub mod condition;
pub mod error;
pub mod feedback;
pub mod work;

pub use condition::{
    Condition, ConditionStatus, find_condition, is_condition_true, set_condition,
    CONDITION_AVAILABLE, CONDITION_STATUS_FEEDBACK_SYNCED,
};
pub use error::{CoreError, ErrorCategory, Result};
pub use feedback::{FeedbackRule, FeedbackValue, FieldValue, PathSpec, ValueType};
pub use work::{
    Gvk, Manifest, ManifestCondition, ManifestConfig, ManifestResourceMeta, ResourceSelector,
    StatusFeedbackResult, Work, WorkId, WorkMeta, WorkSpec, WorkStatus,
};
