use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use workstatus_core::{Manifest, ManifestResourceMeta};
use workstatus_storage::{SpokeClient, SpokeError};

/// Version-agnostic identity of a live object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl From<&ManifestResourceMeta> for ObjectKey {
    fn from(meta: &ManifestResourceMeta) -> Self {
        Self {
            group: meta.group.clone(),
            kind: meta.kind.clone(),
            namespace: meta.namespace.clone(),
            name: meta.name.clone(),
        }
    }
}

/// In-memory stand-in for a spoke cluster.
///
/// Objects are served for any version of their kind. Fetching a kind that was
/// never registered fails with a mapping error, like a cluster without the
/// matching API.
#[derive(Debug, Default)]
pub struct InMemorySpokeClient {
    objects: DashMap<ObjectKey, Value>,
    kinds: DashSet<(String, String)>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
}

impl InMemorySpokeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `group`/`kind` fetchable even when no object of it exists.
    pub fn register_kind(&self, group: impl Into<String>, kind: impl Into<String>) {
        self.kinds.insert((group.into(), kind.into()));
    }

    /// Creates or replaces a live object, registering its kind.
    pub fn apply(&self, object: Value) -> workstatus_core::Result<ManifestResourceMeta> {
        let meta = Manifest(object.clone()).resource_meta(0)?;
        self.register_kind(&meta.group, &meta.kind);
        self.objects.insert(ObjectKey::from(&meta), object);
        Ok(meta)
    }

    /// Applies every object, stopping at the first one that cannot be decoded.
    pub fn apply_all(
        &self,
        objects: impl IntoIterator<Item = Value>,
    ) -> workstatus_core::Result<usize> {
        let mut count = 0;
        for object in objects {
            self.apply(object)?;
            count += 1;
        }
        Ok(count)
    }

    /// Replaces the `status` of an existing object.
    pub fn set_status(&self, resource: &ManifestResourceMeta, status: Value) -> bool {
        match self.objects.get_mut(&ObjectKey::from(resource)) {
            Some(mut object) => {
                if let Some(map) = object.as_object_mut() {
                    map.insert("status".to_string(), status);
                }
                true
            }
            None => false,
        }
    }

    pub fn delete(&self, resource: &ManifestResourceMeta) -> Option<Value> {
        self.objects
            .remove(&ObjectKey::from(resource))
            .map(|(_, object)| object)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Makes every subsequent fetch fail with [`SpokeError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delays every subsequent fetch by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpokeClient for InMemorySpokeClient {
    async fn get(&self, resource: &ManifestResourceMeta) -> Result<Value, SpokeError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SpokeError::unavailable("connection refused"));
        }

        if !self
            .kinds
            .contains(&(resource.group.clone(), resource.kind.clone()))
        {
            return Err(SpokeError::no_resource_mapping(resource.gvk()));
        }

        self.objects
            .get(&ObjectKey::from(resource))
            .map(|object| object.value().clone())
            .ok_or_else(|| SpokeError::not_found(resource))
    }
}
