//! Work records: the manifests deployed on a spoke cluster and the status
//! reported back for them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::condition::Condition;
use crate::error::{CoreError, Result};
use crate::feedback::{FeedbackRule, FeedbackValue};

/// Group, version and kind of a resource. The core group is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gvk {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Splits an `apiVersion` such as `apps/v1` or `v1`.
    pub fn from_api_version(api_version: &str, kind: impl Into<String>) -> Result<Self> {
        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };
        if version.is_empty() || version.contains('/') {
            return Err(CoreError::invalid_api_version(api_version));
        }
        Ok(Self::new(group, version, kind))
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// Identifies one work record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkId {
    pub namespace: String,
    pub name: String,
}

impl WorkId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A raw resource document as declared in the work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(pub Value);

impl Manifest {
    /// Decodes the resource coordinates of this manifest.
    pub fn resource_meta(&self, ordinal: usize) -> Result<ManifestResourceMeta> {
        let str_field = |value: Option<&Value>| {
            value
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let api_version = str_field(self.0.get("apiVersion"))
            .ok_or_else(|| CoreError::incomplete_resource_meta(ordinal, "missing apiVersion"))?;
        let kind = str_field(self.0.get("kind"))
            .ok_or_else(|| CoreError::incomplete_resource_meta(ordinal, "missing kind"))?;
        let metadata = self.0.get("metadata");
        let name = str_field(metadata.and_then(|m| m.get("name")))
            .ok_or_else(|| CoreError::incomplete_resource_meta(ordinal, "missing metadata.name"))?;
        let namespace = str_field(metadata.and_then(|m| m.get("namespace"))).unwrap_or_default();

        let gvk = Gvk::from_api_version(&api_version, kind)
            .map_err(|e| CoreError::incomplete_resource_meta(ordinal, e.to_string()))?;

        Ok(ManifestResourceMeta {
            ordinal,
            group: gvk.group,
            version: gvk.version,
            kind: gvk.kind,
            name,
            namespace,
        })
    }
}

/// Coordinates of one manifest's resource together with its ordinal in the work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestResourceMeta {
    pub ordinal: usize,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

impl ManifestResourceMeta {
    /// Placeholder for a manifest whose coordinates could not be decoded.
    pub fn unresolved(ordinal: usize) -> Self {
        Self {
            ordinal,
            ..Default::default()
        }
    }

    pub fn gvk(&self) -> Gvk {
        Gvk::new(&self.group, &self.version, &self.kind)
    }
}

impl fmt::Display for ManifestResourceMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {}", self.gvk(), self.name)
        } else {
            write!(f, "{} {}/{}", self.gvk(), self.namespace, self.name)
        }
    }
}

/// Picks the manifests a [`ManifestConfig`] applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceSelector {
    #[serde(default)]
    pub group: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ResourceSelector {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn matches(&self, meta: &ManifestResourceMeta) -> bool {
        fn optional(expected: &Option<String>, actual: &str) -> bool {
            expected.as_deref().is_none_or(|e| e == actual)
        }

        self.group == meta.group
            && self.kind == meta.kind
            && optional(&self.version, &meta.version)
            && optional(&self.namespace, &meta.namespace)
            && optional(&self.name, &meta.name)
    }
}

/// Status feedback configuration for the manifests matched by `resource`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestConfig {
    pub resource: ResourceSelector,
    #[serde(default)]
    pub feedback_rules: Vec<FeedbackRule>,
    /// Consecutive identical observations after which extraction stops.
    /// Zero never stops.
    #[serde(default)]
    pub stop_sync_threshold: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSpec {
    #[serde(default)]
    pub workload: Vec<Manifest>,
    #[serde(default)]
    pub manifest_configs: Vec<ManifestConfig>,
}

impl WorkSpec {
    /// First configuration whose selector matches the resource.
    pub fn config_for(&self, meta: &ManifestResourceMeta) -> Option<&ManifestConfig> {
        self.manifest_configs
            .iter()
            .find(|config| config.resource.matches(meta))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFeedbackResult {
    #[serde(default)]
    pub values: Vec<FeedbackValue>,
}

/// Reported state of one manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCondition {
    pub resource_meta: ManifestResourceMeta,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub status_feedback: StatusFeedbackResult,
}

impl ManifestCondition {
    pub fn new(resource_meta: ManifestResourceMeta) -> Self {
        Self {
            resource_meta,
            conditions: Vec::new(),
            status_feedback: StatusFeedbackResult::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub manifests: Vec<ManifestCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkMeta {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub generation: i64,
    /// Revision used for conditional writes; bumped on every stored change.
    #[serde(default)]
    pub resource_version: u64,
}

/// A set of manifests deployed together, with their reported status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub metadata: WorkMeta,
    #[serde(default)]
    pub spec: WorkSpec,
    #[serde(default)]
    pub status: WorkStatus,
}

impl Work {
    pub fn new(id: WorkId, spec: WorkSpec) -> Self {
        Self {
            metadata: WorkMeta {
                namespace: id.namespace,
                name: id.name,
                generation: 1,
                resource_version: 0,
            },
            spec,
            status: WorkStatus::default(),
        }
    }

    pub fn id(&self) -> WorkId {
        WorkId::new(&self.metadata.namespace, &self.metadata.name)
    }
}
