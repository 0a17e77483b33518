//! Import cycle implementation.
//!
//! One `ImportCycle` drives one run:
//! - Fetch: sequential pull from the getter stream
//! - Store: one task per payload, bounded by `concurrent_count`
//! - Finish: drain, decide final status, notify once, persist

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::{FutureExt, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::status::{
    now_secs, ChildStatus, FetchStatus, NotifyStatus, StatusDocument, StatusStore,
};

use super::config::CycleConfig;
use super::error::{error_chain, panic_message, FetchError, NotifyError, StoreError};
use super::pool::BoundedTaskPool;
use super::traits::{FetchBatch, Getter, Notifier, Storer};

/// Controller for a single import run.
///
/// The status document is shared with every store task through one mutex;
/// all mutations of counts, status and child entries happen under it.
pub struct ImportCycle<G: ?Sized, S: ?Sized, N: ?Sized> {
    config: CycleConfig,
    getter: Arc<G>,
    storer: Arc<S>,
    notifier: Arc<N>,
    status_store: Arc<dyn StatusStore>,
    document: Arc<Mutex<StatusDocument>>,
    fetch_id: String,
    tenant_id: String,
}

impl<G, S, N> ImportCycle<G, S, N>
where
    G: Getter + ?Sized + 'static,
    S: Storer + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    /// Creates a cycle with a fresh `RUNNING` status document.
    pub fn new(
        import_type: impl Into<String>,
        tenant_id: impl Into<String>,
        config: CycleConfig,
        getter: Arc<G>,
        storer: Arc<S>,
        notifier: Arc<N>,
        status_store: Arc<dyn StatusStore>,
    ) -> Self {
        let document = StatusDocument::new(import_type, tenant_id);
        let fetch_id = document.fetch_id.clone();
        let tenant_id = document.tenant_id.clone();

        Self {
            config,
            getter,
            storer,
            notifier,
            status_store,
            document: Arc::new(Mutex::new(document)),
            fetch_id,
            tenant_id,
        }
    }

    /// Identifier of this run.
    pub fn fetch_id(&self) -> &str {
        &self.fetch_id
    }

    /// Copy of the status document as it is right now.
    pub async fn snapshot(&self) -> StatusDocument {
        self.document.lock().await.clone()
    }

    /// Runs the cycle to completion and returns the final status document.
    ///
    /// Never fails: fetch, store and notify errors are all recorded in the
    /// returned document.
    pub async fn run(self) -> StatusDocument {
        self.register().await;
        self.execute().await
    }

    /// Persists the `RUNNING` document, then runs the rest of the cycle on
    /// a background task. The document is queryable once this returns.
    pub async fn start(self) -> JoinHandle<StatusDocument> {
        self.register().await;
        tokio::spawn(self.execute())
    }

    async fn register(&self) {
        let initial = self.snapshot().await;
        if let Err(e) = self.status_store.insert(&initial) {
            warn!("Failed to insert status document {}: {}", self.fetch_id, e);
        }
    }

    async fn execute(self) -> StatusDocument {
        let started = Instant::now();
        info!(
            "Starting import cycle {} (tenant: {}, getter: {}, storer: {}, concurrent_count: {})",
            self.fetch_id,
            self.tenant_id,
            self.getter.name(),
            self.storer.name(),
            self.config.concurrent_count
        );

        let mut pool = BoundedTaskPool::new(self.config.concurrent_count);
        self.fetch_all(&mut pool).await;

        debug!(
            "Fetch loop for {} finished after {} records, waiting for {} outstanding stores",
            self.fetch_id,
            pool.submitted(),
            pool.outstanding()
        );
        pool.drain().await;

        let status = {
            let mut doc = self.document.lock().await;
            doc.mark_succeeded();
            doc.end_timestamp = Some(now_secs());
            doc.status
        };

        match status {
            FetchStatus::Fail => {
                let doc = self.document.lock().await;
                error!(
                    "Import cycle {} failed (records: {}, failed children: {}, error: {})",
                    self.fetch_id,
                    doc.total_records,
                    doc.failed_children(),
                    if doc.error.is_empty() { "none" } else { doc.error.as_str() }
                );
            }
            _ => info!("Import cycle {} succeeded", self.fetch_id),
        }

        self.notify().await;

        let final_doc = self.snapshot().await;
        if let Err(e) = self.status_store.update(&final_doc) {
            warn!("Failed to update status document {}: {}", self.fetch_id, e);
        }

        metrics::CYCLES_TOTAL
            .with_label_values(&[final_doc.status.as_str()])
            .inc();
        metrics::CYCLE_DURATION
            .with_label_values(&[final_doc.status.as_str()])
            .observe(started.elapsed().as_secs_f64());

        final_doc
    }

    /// Pulls from the getter until it ends or fails, dispatching one store task per payload.
    async fn fetch_all(&self, pool: &mut BoundedTaskPool) {
        info!("Starting getter {} for {}", self.getter.name(), self.fetch_id);
        let mut stream = match std::panic::catch_unwind(AssertUnwindSafe(|| self.getter.fetch())) {
            Ok(stream) => stream,
            Err(panic) => {
                let message = format!("getter panicked: {}", panic_message(panic.as_ref()));
                self.fail_fetch(FetchError::Other(message)).await;
                return;
            }
        };

        loop {
            let next = AssertUnwindSafe(stream.next()).catch_unwind().await;

            let batch = match next {
                Ok(None) => break,
                Ok(Some(Ok(batch))) if batch.payload.is_null() => {
                    self.fail_fetch(FetchError::EmptyPayload).await;
                    break;
                }
                Ok(Some(Ok(batch))) => batch,
                Ok(Some(Err(e))) => {
                    self.fail_fetch(e).await;
                    break;
                }
                Err(panic) => {
                    let message = format!("getter panicked: {}", panic_message(panic.as_ref()));
                    self.fail_fetch(FetchError::Other(message)).await;
                    break;
                }
            };

            self.dispatch(pool, batch).await;
        }
    }

    async fn dispatch(&self, pool: &mut BoundedTaskPool, batch: FetchBatch) {
        {
            let mut doc = self.document.lock().await;
            doc.total_records = doc.total_records.saturating_add(batch.count);
        }
        metrics::RECORDS_FETCHED.inc_by(batch.count);
        debug!(
            "Fetched batch of {} for {}: {}",
            batch.count, self.fetch_id, batch.payload
        );

        let task = store_record(
            Arc::clone(&self.storer),
            Arc::clone(&self.document),
            self.fetch_id.clone(),
            self.tenant_id.clone(),
            batch.payload,
        );
        pool.submit(task).await;
    }

    /// Records a fatal fetch error and persists the failed document immediately.
    async fn fail_fetch(&self, e: FetchError) {
        let error = error_chain(&e);
        error!("Getter {} failed for {}: {}", self.getter.name(), self.fetch_id, error);
        metrics::FETCH_FAILURES.inc();

        let snapshot = {
            let mut doc = self.document.lock().await;
            doc.error = error;
            doc.mark_failed();
            doc.clone()
        };

        if let Err(e) = self.status_store.update(&snapshot) {
            warn!("Failed to update status document {}: {}", self.fetch_id, e);
        }
    }

    /// Makes the single notify attempt of the run. Failures are recorded, never raised.
    async fn notify(&self) {
        let name = self.notifier.name().to_string();
        let mut entry = NotifyStatus::new(&name);
        let snapshot = self.snapshot().await;

        info!("Starting notifier {} for {}", name, self.fetch_id);
        let outcome = AssertUnwindSafe(self.notifier.notify(&snapshot))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(NotifyError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(()) => {
                info!("Notifier {} complete for {}", name, self.fetch_id);
                metrics::NOTIFY_ATTEMPTS.with_label_values(&["success"]).inc();
            }
            Err(e) => {
                entry.error = error_chain(&e);
                error!("Notifier {} failed for {}: {}", name, self.fetch_id, entry.error);
                metrics::NOTIFY_ATTEMPTS.with_label_values(&["fail"]).inc();
            }
        }

        self.document.lock().await.notify.push(entry);
    }
}

/// Stores one payload and appends its child entry, whatever the outcome.
async fn store_record<S>(
    storer: Arc<S>,
    document: Arc<Mutex<StatusDocument>>,
    fetch_id: String,
    tenant_id: String,
    payload: serde_json::Value,
) where
    S: Storer + ?Sized,
{
    let child = ChildStatus::start(&fetch_id, tenant_id);
    debug!("Starting storer {} for {}", storer.name(), fetch_id);

    metrics::STORES_IN_FLIGHT.inc();
    let started = Instant::now();
    let outcome = AssertUnwindSafe(storer.store(payload, &fetch_id))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(StoreError::Panicked(panic_message(panic.as_ref()))));
    metrics::STORES_IN_FLIGHT.dec();

    let child = match outcome {
        Ok(result) => {
            debug!("Store complete for {}", fetch_id);
            child.succeeded(result)
        }
        Err(e) => {
            let error = error_chain(&e);
            warn!("Storer {} failed for {}: {}", storer.name(), fetch_id, error);
            child.failed(error)
        }
    };

    let label = match child.status {
        FetchStatus::Fail => "fail",
        _ => "success",
    };
    metrics::RECORDS_STORED.with_label_values(&[label]).inc();
    metrics::STORE_DURATION
        .with_label_values(&[label])
        .observe(started.elapsed().as_secs_f64());

    let mut doc = document.lock().await;
    if child.status == FetchStatus::Fail && doc.mark_failed() {
        info!("Import cycle {} marked failed by a record failure", fetch_id);
    }
    doc.child_imports.push(child);
}
