//! Mapping configured feedback rules to concrete path lists.

use std::collections::HashMap;
use std::sync::LazyLock;

use workstatus_core::{FeedbackRule, Gvk, PathSpec};

use crate::error::FeedbackError;

/// Source of the path sets used by [`FeedbackRule::CommonFields`].
pub trait CommonFieldsRules: Send + Sync {
    /// Returns the paths registered for `gvk`, if any.
    fn paths_for(&self, gvk: &Gvk) -> Option<&[PathSpec]>;
}

impl CommonFieldsRules for HashMap<Gvk, Vec<PathSpec>> {
    fn paths_for(&self, gvk: &Gvk) -> Option<&[PathSpec]> {
        self.get(gvk).map(Vec::as_slice)
    }
}

static BUILTIN_TABLE: LazyLock<HashMap<Gvk, Vec<PathSpec>>> = LazyLock::new(|| {
    let mut table = HashMap::new();

    table.insert(
        Gvk::new("apps", "v1", "Deployment"),
        vec![
            PathSpec::new("ReadyReplicas", ".status.readyReplicas"),
            PathSpec::new("Replicas", ".status.replicas"),
            PathSpec::new("AvailableReplicas", ".status.availableReplicas"),
        ],
    );
    table.insert(
        Gvk::new("apps", "v1", "StatefulSet"),
        vec![
            PathSpec::new("ReadyReplicas", ".status.readyReplicas"),
            PathSpec::new("Replicas", ".status.replicas"),
            PathSpec::new("AvailableReplicas", ".status.availableReplicas"),
        ],
    );
    table.insert(
        Gvk::new("apps", "v1", "DaemonSet"),
        vec![
            PathSpec::new("NumberReady", ".status.numberReady"),
            PathSpec::new("DesiredNumberScheduled", ".status.desiredNumberScheduled"),
            PathSpec::new("NumberAvailable", ".status.numberAvailable"),
        ],
    );
    table.insert(
        Gvk::new("batch", "v1", "Job"),
        vec![
            PathSpec::new(
                "JobComplete",
                r#".status.conditions[?(@.type=="Complete")].status"#,
            ),
            PathSpec::new("JobSucceeded", ".status.succeeded"),
        ],
    );
    table.insert(
        Gvk::new("", "v1", "Pod"),
        vec![
            PathSpec::new("PodReady", r#".status.conditions[?(@.type=="Ready")].status"#),
            PathSpec::new("PodPhase", ".status.phase"),
        ],
    );

    table
});

/// The built-in common fields table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRules;

impl CommonFieldsRules for BuiltinRules {
    fn paths_for(&self, gvk: &Gvk) -> Option<&[PathSpec]> {
        BUILTIN_TABLE.get(gvk).map(Vec::as_slice)
    }
}

/// Paths to evaluate for one rule, plus the entries dropped on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub paths: Vec<PathSpec>,
    pub skipped: Vec<FeedbackError>,
}

/// Resolves `rule` for a resource of type `gvk`.
///
/// A `CommonFields` rule for a type with no table entry is an error. Explicit
/// paths bound to another version are reported in `skipped` rather than
/// failing the whole rule.
pub fn resolve(
    rules: &dyn CommonFieldsRules,
    gvk: &Gvk,
    rule: &FeedbackRule,
) -> Result<ResolvedPaths, FeedbackError> {
    match rule {
        FeedbackRule::CommonFields => match rules.paths_for(gvk) {
            Some(paths) if !paths.is_empty() => Ok(ResolvedPaths {
                paths: paths.to_vec(),
                skipped: Vec::new(),
            }),
            _ => Err(FeedbackError::no_builtin_rule(gvk.clone())),
        },
        FeedbackRule::JsonPaths { json_paths } => {
            let mut resolved = ResolvedPaths::default();
            for path in json_paths {
                match &path.version {
                    Some(version) if !version.is_empty() && *version != gvk.version => {
                        resolved
                            .skipped
                            .push(FeedbackError::version_mismatch(&path.name));
                    }
                    _ => resolved.paths.push(path.clone()),
                }
            }
            Ok(resolved)
        }
    }
}
