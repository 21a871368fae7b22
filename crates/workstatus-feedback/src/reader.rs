use std::sync::Arc;

use serde_json::Value;
use tracing::trace;
use workstatus_core::{FeedbackRule, FeedbackValue, Gvk};

use crate::error::{AggregateError, FeedbackError};
use crate::extract::extract;
use crate::rules::{BuiltinRules, CommonFieldsRules, resolve};

/// Values extracted from one resource together with every error met on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackOutcome {
    pub values: Vec<FeedbackValue>,
    pub error: Option<AggregateError>,
}

/// Reads status feedback values from live resource documents.
#[derive(Clone)]
pub struct StatusReader {
    common_fields: Arc<dyn CommonFieldsRules>,
}

impl Default for StatusReader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatusReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReader").finish_non_exhaustive()
    }
}

impl StatusReader {
    /// Creates a reader backed by the built-in common fields table.
    pub fn new() -> Self {
        Self::with_rules(Arc::new(BuiltinRules))
    }

    pub fn with_rules(common_fields: Arc<dyn CommonFieldsRules>) -> Self {
        Self { common_fields }
    }

    /// Evaluates a single rule. Extraction errors for individual paths are
    /// collected into `errors` and do not stop the remaining paths.
    pub fn values_by_rule(
        &self,
        object: &Value,
        gvk: &Gvk,
        rule: &FeedbackRule,
        errors: &mut Vec<FeedbackError>,
    ) -> Vec<FeedbackValue> {
        let resolved = match resolve(self.common_fields.as_ref(), gvk, rule) {
            Ok(resolved) => resolved,
            Err(err) => {
                errors.push(err);
                return Vec::new();
            }
        };
        errors.extend(resolved.skipped);

        let mut values = Vec::with_capacity(resolved.paths.len());
        for path in &resolved.paths {
            match extract(&path.name, &path.path, object) {
                Ok(Some(value)) => values.push(value),
                Ok(None) => trace!(name = %path.name, path = %path.path, "no value found"),
                Err(err) => errors.push(err),
            }
        }
        values
    }

    /// Evaluates every rule in order and concatenates the results.
    pub fn values_by_rules(&self, object: &Value, gvk: &Gvk, rules: &[FeedbackRule]) -> FeedbackOutcome {
        let mut errors = Vec::new();
        let mut values = Vec::new();
        for rule in rules {
            values.extend(self.values_by_rule(object, gvk, rule, &mut errors));
        }

        FeedbackOutcome {
            values,
            error: AggregateError::from_errors(errors),
        }
    }
}
