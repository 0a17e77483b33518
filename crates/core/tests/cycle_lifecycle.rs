//! Import cycle lifecycle integration tests.
//!
//! These tests drive whole cycles through the public API with a file-backed
//! status store:
//! - Documents survive reopening the database
//! - Several runs share one storer and one store
//! - A getter fed from a channel is consumed lazily

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;

use fetchcycle_core::{
    testing::{MockGetter, MockNotifier, MockStorer},
    CycleConfig, FetchBatch, FetchError, FetchStatus, FetchStream, Getter, ImportCycle,
    SqliteStatusStore, StatusFilter, StatusStore,
};

/// Test helper holding the shared collaborators.
struct TestHarness {
    storer: Arc<MockStorer>,
    notifier: Arc<MockNotifier>,
    store: Arc<SqliteStatusStore>,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteStatusStore::new(&temp_dir.path().join("status.db"))
                .expect("Failed to create status store"),
        );

        Self {
            storer: Arc::new(MockStorer::new()),
            notifier: Arc::new(MockNotifier::new()),
            store,
            temp_dir,
        }
    }

    fn cycle<G: Getter + 'static>(
        &self,
        tenant_id: &str,
        getter: G,
    ) -> ImportCycle<G, MockStorer, MockNotifier> {
        ImportCycle::new(
            "vehicle",
            tenant_id,
            CycleConfig::default().with_concurrent_count(2),
            Arc::new(getter),
            Arc::clone(&self.storer),
            Arc::clone(&self.notifier),
            Arc::clone(&self.store) as Arc<dyn StatusStore>,
        )
    }

    fn reopen_store(&self) -> SqliteStatusStore {
        SqliteStatusStore::new(&self.temp_dir.path().join("status.db"))
            .expect("Failed to reopen status store")
    }
}

/// Getter that yields whatever is sent on a channel until it closes.
struct ChannelGetter {
    receiver: std::sync::Mutex<Option<mpsc::Receiver<Result<FetchBatch, FetchError>>>>,
}

impl ChannelGetter {
    fn new(receiver: mpsc::Receiver<Result<FetchBatch, FetchError>>) -> Self {
        Self {
            receiver: std::sync::Mutex::new(Some(receiver)),
        }
    }
}

impl Getter for ChannelGetter {
    fn name(&self) -> &str {
        "channel"
    }

    fn fetch(&self) -> FetchStream {
        let receiver = self.receiver.lock().unwrap().take();
        match receiver {
            Some(receiver) => stream::unfold(receiver, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed(),
            None => stream::empty().boxed(),
        }
    }
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let harness = TestHarness::new();
    let getter = MockGetter::new().with_records(vec![json!({"vin": "A"}), json!({"vin": "B"})]);

    let doc = harness.cycle("acme", getter).run().await;
    assert_eq!(doc.status, FetchStatus::Success);

    let reopened = harness.reopen_store();
    let stored = reopened.get(&doc.fetch_id).unwrap().unwrap();
    assert_eq!(stored, doc);
    assert_eq!(stored.child_imports.len(), 2);
    assert_eq!(stored.notify.len(), 1);
}

#[tokio::test]
async fn test_concurrent_runs_share_store() {
    let harness = TestHarness::new();

    let ok = harness.cycle(
        "acme",
        MockGetter::new().with_records(vec![json!({"vin": "A"}), json!({"vin": "B"})]),
    );
    let bad = harness.cycle(
        "globex",
        MockGetter::new()
            .with_records(vec![json!({"vin": "C"})])
            .with_failure("source went away"),
    );

    let (ok_doc, bad_doc) = tokio::join!(ok.run(), bad.run());

    assert_eq!(ok_doc.status, FetchStatus::Success);
    assert_eq!(bad_doc.status, FetchStatus::Fail);
    assert_eq!(harness.storer.store_count().await, 3);
    assert_eq!(harness.notifier.notified_documents().await.len(), 2);

    let failed = harness
        .store
        .list(&StatusFilter::new().with_status(FetchStatus::Fail))
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].tenant_id, "globex");
    assert!(failed[0].error.contains("source went away"));

    let acme = harness
        .store
        .count(&StatusFilter::new().with_tenant_id("acme"))
        .unwrap();
    assert_eq!(acme, 1);
}

#[tokio::test]
async fn test_channel_getter_is_consumed_lazily() {
    let harness = TestHarness::new();
    let (tx, rx) = mpsc::channel(1);

    let cycle = harness.cycle("acme", ChannelGetter::new(rx));
    let fetch_id = cycle.fetch_id().to_string();
    let handle = cycle.start().await;

    tx.send(Ok(FetchBatch::new(json!({"vin": "A"}), 10)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let running = harness.store.get(&fetch_id).unwrap().unwrap();
    assert_eq!(running.status, FetchStatus::Running);

    tx.send(Ok(FetchBatch::single(json!({"vin": "B"}))))
        .await
        .unwrap();
    drop(tx);

    let doc = handle.await.unwrap();
    assert_eq!(doc.status, FetchStatus::Success);
    assert_eq!(doc.total_records, 11);
    assert_eq!(doc.child_imports.len(), 2);
}
