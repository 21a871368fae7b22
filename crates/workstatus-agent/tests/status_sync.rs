use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_test::assert_ok;
use workstatus_agent::controller::aggregate::{
    REASON_RESOURCES_AVAILABLE, REASON_RESOURCES_NOT_AVAILABLE, REASON_RESOURCES_STATUS_UNKNOWN,
};
use workstatus_agent::controller::available::{
    REASON_FETCHING_RESOURCE_FAILED, REASON_INCOMPLETE_RESOURCE_META,
    REASON_RESOURCE_NOT_AVAILABLE,
};
use workstatus_agent::controller::feedback::{REASON_FEEDBACK_SYNC_FAILED, REASON_FEEDBACK_SYNCED};
use workstatus_agent::{StatusSyncLoop, SyncOutcome, WorkSyncer};
use workstatus_core::{
    CONDITION_AVAILABLE, CONDITION_STATUS_FEEDBACK_SYNCED, ConditionStatus, FeedbackRule,
    Manifest, ManifestConfig, PathSpec, ResourceSelector, Work, WorkId, WorkSpec,
    WorkStatus, find_condition,
};
use workstatus_db_memory::{InMemorySpokeClient, InMemoryWorkStore};
use workstatus_storage::{StorageError, WorkStore};

const CALL_TIMEOUT: Duration = Duration::from_secs(5);

fn deployment(name: &str) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": name, "namespace": "default" }
    })
}

fn live_deployment(name: &str, ready: i64) -> Value {
    let mut object = deployment(name);
    object["status"] = json!({ "readyReplicas": ready, "replicas": 3, "availableReplicas": ready });
    object
}

fn common_fields(threshold: u32) -> ManifestConfig {
    ManifestConfig {
        resource: ResourceSelector::new("apps", "Deployment"),
        feedback_rules: vec![FeedbackRule::CommonFields],
        stop_sync_threshold: threshold,
    }
}

fn work(name: &str, workload: Vec<Value>, configs: Vec<ManifestConfig>) -> Work {
    Work::new(
        WorkId::new("cluster1", name),
        WorkSpec {
            workload: workload.into_iter().map(Manifest).collect(),
            manifest_configs: configs,
        },
    )
}

struct Harness {
    store: Arc<InMemoryWorkStore>,
    spoke: Arc<InMemorySpokeClient>,
    syncer: Arc<WorkSyncer>,
}

impl Harness {
    fn new() -> Self {
        Self::with_timeout(CALL_TIMEOUT)
    }

    fn with_timeout(timeout: Duration) -> Self {
        let store = Arc::new(InMemoryWorkStore::new());
        let spoke = Arc::new(InMemorySpokeClient::new());
        let syncer = Arc::new(WorkSyncer::new(store.clone(), spoke.clone(), timeout));
        Self {
            store,
            spoke,
            syncer,
        }
    }

    async fn stored(&self, id: &WorkId) -> Work {
        self.store.get(id).await.unwrap().unwrap()
    }

    async fn sync(&self, id: &WorkId) -> SyncOutcome {
        let work = self.stored(id).await;
        self.syncer.sync(&work).await.unwrap()
    }
}

fn integer(status: &WorkStatus, ordinal: usize, name: &str) -> Option<i64> {
    status.manifests[ordinal]
        .status_feedback
        .values
        .iter()
        .find(|v| v.name == name)
        .and_then(|v| v.value.as_integer())
}

#[tokio::test]
async fn test_available_resources_report_feedback() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 2)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(0)]))
        .id();

    let outcome = h.sync(&id).await;
    assert!(matches!(outcome, SyncOutcome::Updated { .. }));

    let status = h.stored(&id).await.status;
    let available = find_condition(&status.conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(available.status, ConditionStatus::True);
    assert_eq!(available.reason, REASON_RESOURCES_AVAILABLE);
    assert_eq!(available.message, "All resources are available");
    assert_eq!(available.observed_generation, 1);

    let manifest = &status.manifests[0];
    assert_eq!(manifest.resource_meta.name, "web");
    let synced = find_condition(&manifest.conditions, CONDITION_STATUS_FEEDBACK_SYNCED).unwrap();
    assert_eq!(synced.reason, REASON_FEEDBACK_SYNCED);
    assert_eq!(integer(&status, 0, "ReadyReplicas"), Some(2));
    assert_eq!(integer(&status, 0, "Replicas"), Some(3));
}

#[tokio::test]
async fn test_second_pass_writes_nothing() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 1)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(0)]))
        .id();

    h.sync(&id).await;
    let version = h.stored(&id).await.metadata.resource_version;

    assert_eq!(h.sync(&id).await, SyncOutcome::Unchanged);
    assert_eq!(h.stored(&id).await.metadata.resource_version, version);
}

#[tokio::test]
async fn test_missing_resource_does_not_affect_siblings() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("present", 3)).unwrap();
    let id = h
        .store
        .insert(work(
            "pair",
            vec![deployment("present"), deployment("absent")],
            vec![common_fields(0)],
        ))
        .id();

    h.sync(&id).await;
    let status = h.stored(&id).await.status;

    let present = find_condition(&status.manifests[0].conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(present.status, ConditionStatus::True);
    assert_eq!(integer(&status, 0, "ReadyReplicas"), Some(3));

    let absent = find_condition(&status.manifests[1].conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(absent.status, ConditionStatus::False);
    assert_eq!(absent.reason, REASON_RESOURCE_NOT_AVAILABLE);
    assert!(status.manifests[1].status_feedback.values.is_empty());
    assert!(find_condition(&status.manifests[1].conditions, CONDITION_STATUS_FEEDBACK_SYNCED).is_none());

    let aggregate = find_condition(&status.conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(aggregate.status, ConditionStatus::False);
    assert_eq!(aggregate.reason, REASON_RESOURCES_NOT_AVAILABLE);
    assert_eq!(aggregate.message, "1 of 2 resources are not available");
}

#[tokio::test]
async fn test_unknown_when_meta_incomplete_or_kind_unmapped() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 1)).unwrap();
    let unmapped = json!({
        "apiVersion": "example.io/v1",
        "kind": "Widget",
        "metadata": { "name": "w" }
    });
    let nameless = json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": {} });
    let id = h
        .store
        .insert(work(
            "mixed",
            vec![deployment("web"), unmapped, nameless],
            vec![common_fields(0)],
        ))
        .id();

    h.sync(&id).await;
    let status = h.stored(&id).await.status;

    for ordinal in [1, 2] {
        let condition =
            find_condition(&status.manifests[ordinal].conditions, CONDITION_AVAILABLE).unwrap();
        assert_eq!(condition.status, ConditionStatus::Unknown);
        assert_eq!(condition.reason, REASON_INCOMPLETE_RESOURCE_META);
        assert_eq!(status.manifests[ordinal].resource_meta.ordinal, ordinal);
    }

    let aggregate = find_condition(&status.conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(aggregate.status, ConditionStatus::Unknown);
    assert_eq!(aggregate.reason, REASON_RESOURCES_STATUS_UNKNOWN);
    assert_eq!(aggregate.message, "2 of 3 resources have unknown status");
}

#[tokio::test]
async fn test_slow_spoke_is_unknown() {
    let h = Harness::with_timeout(Duration::from_millis(50));
    h.spoke.apply(live_deployment("web", 1)).unwrap();
    h.spoke.set_latency(Duration::from_millis(500));
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(0)]))
        .id();

    h.sync(&id).await;
    let status = h.stored(&id).await.status;
    let condition = find_condition(&status.manifests[0].conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(condition.status, ConditionStatus::Unknown);
    assert_eq!(condition.reason, REASON_FETCHING_RESOURCE_FAILED);
    assert!(condition.message.contains("timed out"));
}

#[tokio::test]
async fn test_extraction_errors_keep_sibling_values() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 2)).unwrap();
    let config = ManifestConfig {
        resource: ResourceSelector::new("apps", "Deployment"),
        feedback_rules: vec![FeedbackRule::json_paths([
            PathSpec::new("Ready", ".status.readyReplicas"),
            PathSpec::new("Broken", ".status["),
            PathSpec::new("Whole", ".status"),
        ])],
        stop_sync_threshold: 0,
    };
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![config]))
        .id();

    h.sync(&id).await;
    let status = h.stored(&id).await.status;

    assert_eq!(integer(&status, 0, "Ready"), Some(2));
    assert_eq!(status.manifests[0].status_feedback.values.len(), 1);

    let synced =
        find_condition(&status.manifests[0].conditions, CONDITION_STATUS_FEEDBACK_SYNCED).unwrap();
    assert_eq!(synced.status, ConditionStatus::False);
    assert_eq!(synced.reason, REASON_FEEDBACK_SYNC_FAILED);
    assert!(synced.message.starts_with("Sync status feedback failed with error"));
    assert!(synced.message.contains("Broken"));
    assert!(synced.message.contains("Whole"));

    let aggregate = find_condition(&status.conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(aggregate.status, ConditionStatus::True);
}

#[tokio::test]
async fn test_manifests_without_config_only_report_availability() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 2)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![]))
        .id();

    h.sync(&id).await;
    let status = h.stored(&id).await.status;
    assert!(status.manifests[0].status_feedback.values.is_empty());
    assert!(find_condition(&status.manifests[0].conditions, CONDITION_AVAILABLE).is_some());
    assert!(find_condition(&status.manifests[0].conditions, CONDITION_STATUS_FEEDBACK_SYNCED).is_none());
}

#[tokio::test]
async fn test_unavailable_resource_keeps_last_values() {
    let h = Harness::new();
    let meta = h.spoke.apply(live_deployment("web", 2)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(0)]))
        .id();
    h.sync(&id).await;

    h.spoke.delete(&meta);
    h.sync(&id).await;

    let status = h.stored(&id).await.status;
    let available = find_condition(&status.manifests[0].conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(available.status, ConditionStatus::False);
    assert_eq!(integer(&status, 0, "ReadyReplicas"), Some(2));
}

#[tokio::test]
async fn test_stale_read_conflicts_without_writing() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 1)).unwrap();
    let stale = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(0)]));
    let id = stale.id();

    let mut spec = stale.spec.clone();
    spec.manifest_configs.clear();
    h.store.update_spec(&id, spec).unwrap();
    let before = h.stored(&id).await;

    let outcome = assert_ok!(h.syncer.sync(&stale).await);
    assert_eq!(outcome, SyncOutcome::Conflict);

    let after = h.stored(&id).await;
    assert_eq!(after, before);
    assert!(after.status.manifests.is_empty());
}

#[tokio::test]
async fn test_stop_sync_threshold_freezes_values() {
    let h = Harness::new();
    let meta = h.spoke.apply(live_deployment("web", 1)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(2)]))
        .id();

    // First observation, then two identical repeats.
    for _ in 0..3 {
        h.sync(&id).await;
    }
    assert_eq!(integer(&h.stored(&id).await.status, 0, "ReadyReplicas"), Some(1));

    h.spoke
        .set_status(&meta, json!({ "readyReplicas": 3, "replicas": 3, "availableReplicas": 3 }));
    assert_eq!(h.sync(&id).await, SyncOutcome::Unchanged);
    assert_eq!(integer(&h.stored(&id).await.status, 0, "ReadyReplicas"), Some(1));

    // Changing the rules starts over.
    let mut spec = h.stored(&id).await.spec;
    spec.manifest_configs[0].feedback_rules = vec![FeedbackRule::json_paths([PathSpec::new(
        "ReadyReplicas",
        ".status.readyReplicas",
    )])];
    h.store.update_spec(&id, spec).unwrap();
    h.sync(&id).await;
    assert_eq!(integer(&h.stored(&id).await.status, 0, "ReadyReplicas"), Some(3));
}

#[tokio::test]
async fn test_conflicted_passes_do_not_advance_stop_sync() {
    let h = Harness::new();
    let meta = h.spoke.apply(live_deployment("web", 1)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(1)]))
        .id();
    h.sync(&id).await;

    // Another writer moves the record on, leaving this copy behind.
    let stale = h.stored(&id).await;
    h.store
        .update_status(&id, stale.metadata.resource_version, stale.status.clone())
        .await
        .unwrap();

    h.spoke
        .set_status(&meta, json!({ "readyReplicas": 3, "replicas": 3, "availableReplicas": 3 }));
    for _ in 0..2 {
        let outcome = assert_ok!(h.syncer.sync(&stale).await);
        assert_eq!(outcome, SyncOutcome::Conflict);
    }
    assert_eq!(integer(&h.stored(&id).await.status, 0, "ReadyReplicas"), Some(1));

    assert!(matches!(h.sync(&id).await, SyncOutcome::Updated { .. }));
    assert_eq!(integer(&h.stored(&id).await.status, 0, "ReadyReplicas"), Some(3));

    for _ in 0..3 {
        assert_eq!(h.sync(&id).await, SyncOutcome::Unchanged);
    }
    assert_eq!(integer(&h.stored(&id).await.status, 0, "ReadyReplicas"), Some(3));
}

#[tokio::test]
async fn test_failed_write_does_not_advance_stop_sync() {
    let h = Harness::new();
    let meta = h.spoke.apply(live_deployment("web", 1)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(1)]))
        .id();
    h.sync(&id).await;
    let work = h.stored(&id).await;

    h.spoke
        .set_status(&meta, json!({ "readyReplicas": 2, "replicas": 3, "availableReplicas": 2 }));
    h.store.set_unavailable(true);
    for _ in 0..2 {
        assert!(h.syncer.sync(&work).await.is_err());
    }
    h.store.set_unavailable(false);

    assert!(matches!(h.sync(&id).await, SyncOutcome::Updated { .. }));
    assert_eq!(integer(&h.stored(&id).await.status, 0, "ReadyReplicas"), Some(2));
}

#[tokio::test]
async fn test_zero_threshold_follows_every_change() {
    let h = Harness::new();
    let meta = h.spoke.apply(live_deployment("web", 1)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(0)]))
        .id();

    for _ in 0..4 {
        h.sync(&id).await;
    }
    h.spoke
        .set_status(&meta, json!({ "readyReplicas": 2, "replicas": 3, "availableReplicas": 2 }));
    assert!(matches!(h.sync(&id).await, SyncOutcome::Updated { .. }));
    assert_eq!(integer(&h.stored(&id).await.status, 0, "ReadyReplicas"), Some(2));
}

#[tokio::test]
async fn test_shrunk_workload_drops_entries() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("a", 1)).unwrap();
    h.spoke.apply(live_deployment("b", 1)).unwrap();
    let id = h
        .store
        .insert(work(
            "web",
            vec![deployment("a"), deployment("b")],
            vec![common_fields(0)],
        ))
        .id();
    h.sync(&id).await;
    assert_eq!(h.stored(&id).await.status.manifests.len(), 2);

    let mut spec = h.stored(&id).await.spec;
    spec.workload.truncate(1);
    h.store.update_spec(&id, spec).unwrap();
    h.sync(&id).await;

    let status = h.stored(&id).await.status;
    assert_eq!(status.manifests.len(), 1);
    assert_eq!(status.manifests[0].resource_meta.name, "a");
    let aggregate = find_condition(&status.conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(aggregate.observed_generation, 2);
}

#[tokio::test]
async fn test_pass_isolates_failures_and_counts_outcomes() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 1)).unwrap();
    h.store
        .insert(work("a", vec![deployment("web")], vec![common_fields(0)]));
    h.store
        .insert(work("b", vec![deployment("missing")], vec![common_fields(0)]));

    let sweep = StatusSyncLoop::new(h.syncer.clone(), Duration::from_secs(60)).with_concurrency(2);

    let first = sweep.sync_all().await.unwrap();
    assert_eq!(first.works, 2);
    assert_eq!(first.updated, 2);
    assert_eq!(first.failed, 0);

    let second = sweep.sync_all().await.unwrap();
    assert_eq!(second.unchanged, 2);
}

#[tokio::test]
async fn test_listing_failure_skips_pass() {
    let h = Harness::new();
    h.store.insert(work("a", vec![deployment("web")], vec![]));
    h.store.set_unavailable(true);

    let sweep = StatusSyncLoop::new(h.syncer.clone(), Duration::from_secs(60));
    let err = sweep.sync_all().await.unwrap_err();
    assert!(matches!(
        err,
        workstatus_agent::ReconcileError::Storage(StorageError::ConnectionError { .. })
    ));

    h.store.set_unavailable(false);
    let summary = sweep.sync_all().await.unwrap();
    assert_eq!(summary.updated, 1);
}

/// Store whose listing never answers in time.
struct SlowStore {
    inner: InMemoryWorkStore,
    delay: Duration,
}

#[async_trait]
impl WorkStore for SlowStore {
    async fn get(&self, id: &WorkId) -> Result<Option<Work>, StorageError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Work>, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list().await
    }

    async fn update_status(
        &self,
        id: &WorkId,
        expected_version: u64,
        status: WorkStatus,
    ) -> Result<u64, StorageError> {
        self.inner.update_status(id, expected_version, status).await
    }
}

#[tokio::test]
async fn test_store_timeout_is_storage_error() {
    let store = Arc::new(SlowStore {
        inner: InMemoryWorkStore::new(),
        delay: Duration::from_millis(500),
    });
    let syncer = Arc::new(WorkSyncer::new(
        store,
        Arc::new(InMemorySpokeClient::new()),
        Duration::from_millis(20),
    ));

    let err = StatusSyncLoop::new(syncer, Duration::from_secs(60))
        .sync_all()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        workstatus_agent::ReconcileError::Storage(StorageError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_loop_stops_on_shutdown() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 1)).unwrap();
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(0)]))
        .id();

    let (tx, rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(
        StatusSyncLoop::new(h.syncer.clone(), Duration::from_secs(1)).run(rx),
    );

    // The first tick fires immediately.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while h.stored(&id).await.status.manifests.is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "first pass did not run");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_non_shutdown_signal_keeps_pass_running() {
    let h = Harness::new();
    h.spoke.apply(live_deployment("web", 1)).unwrap();
    h.spoke.set_latency(Duration::from_millis(200));
    let id = h
        .store
        .insert(work("web", vec![deployment("web")], vec![common_fields(0)]))
        .id();

    let (tx, rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(
        StatusSyncLoop::new(h.syncer.clone(), Duration::from_secs(60)).run(rx),
    );

    // Republishing `false` mid-pass is not a shutdown.
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(false).unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while h.stored(&id).await.status.manifests.is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "pass was abandoned");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}
