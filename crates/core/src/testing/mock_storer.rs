//! Mock storer for testing.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cycle::{StoreError, Storer};

/// A recorded store call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedStore {
    /// The payload that was stored.
    pub payload: serde_json::Value,
    /// The run the payload belongs to.
    pub fetch_id: String,
    /// Whether the store succeeded.
    pub success: bool,
}

/// Mock implementation of the Storer trait.
///
/// Provides controllable behavior for testing:
/// - Track store calls in call order
/// - Fail or panic on specific payloads
/// - Simulate slow stores, globally or per payload
/// - Measure peak concurrency
///
/// Successful stores return `{"stored": true, "fetch_id": .., "payload": ..}`.
#[derive(Debug)]
pub struct MockStorer {
    /// Recorded store calls.
    stores: Arc<RwLock<Vec<RecordedStore>>>,
    /// If set, the next store will fail with this error.
    next_error: Arc<RwLock<Option<StoreError>>>,
    /// Payloads that always fail.
    failing: Arc<RwLock<Vec<serde_json::Value>>>,
    /// Payloads that panic the store call.
    panicking: Arc<RwLock<Vec<serde_json::Value>>>,
    /// Delay applied to every store.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Per-payload delays, keyed by serialized payload.
    delays_for: Arc<RwLock<HashMap<String, Duration>>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockStorer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorer {
    /// Create a new mock storer that accepts everything.
    pub fn new() -> Self {
        Self {
            stores: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failing: Arc::new(RwLock::new(Vec::new())),
            panicking: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
            delays_for: Arc::new(RwLock::new(HashMap::new())),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Get all recorded store calls.
    pub async fn recorded_stores(&self) -> Vec<RecordedStore> {
        self.stores.read().await.clone()
    }

    /// Get the number of store calls performed.
    pub async fn store_count(&self) -> usize {
        self.stores.read().await.len()
    }

    /// Make every store of `payload` fail.
    pub async fn fail_payload(&self, payload: serde_json::Value) {
        self.failing.write().await.push(payload);
    }

    /// Make every store of `payload` panic.
    pub async fn panic_on(&self, payload: serde_json::Value) {
        self.panicking.write().await.push(payload);
    }

    /// Configure the next store to fail with the given error.
    pub async fn set_next_error(&self, error: StoreError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated duration of every store.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Set the simulated duration for one payload. Overrides `set_delay`.
    pub async fn set_delay_for(&self, payload: serde_json::Value, delay: Duration) {
        self.delays_for
            .write()
            .await
            .insert(payload.to_string(), delay);
    }

    /// Highest number of stores observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn outcome_for(&self, payload: &serde_json::Value) -> Option<StoreError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Some(error);
        }
        if self.failing.read().await.contains(payload) {
            return Some(StoreError::Rejected {
                status: 500,
                body: format!("mock rejected {}", payload),
            });
        }
        None
    }

    async fn delay_for(&self, payload: &serde_json::Value) -> Option<Duration> {
        if let Some(delay) = self.delays_for.read().await.get(&payload.to_string()) {
            return Some(*delay);
        }
        *self.delay.read().await
    }
}

/// Decrements the active counter when a store call ends, panics included.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storer for MockStorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn store(
        &self,
        payload: serde_json::Value,
        fetch_id: &str,
    ) -> Result<serde_json::Value, StoreError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        let error = self.outcome_for(&payload).await;
        let should_panic = self.panicking.read().await.contains(&payload);

        self.stores.write().await.push(RecordedStore {
            payload: payload.clone(),
            fetch_id: fetch_id.to_string(),
            success: error.is_none() && !should_panic,
        });

        if let Some(delay) = self.delay_for(&payload).await {
            tokio::time::sleep(delay).await;
        }

        if should_panic {
            panic!("mock storer panic on {}", payload);
        }

        match error {
            Some(error) => Err(error),
            None => Ok(json!({
                "stored": true,
                "fetch_id": fetch_id,
                "payload": payload,
            })),
        }
    }
}
