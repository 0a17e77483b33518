//! Mock getter for testing.

use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cycle::{FetchBatch, FetchError, FetchStream, Getter};

/// Mock implementation of the Getter trait.
///
/// Items are scripted up front with the builder methods and replayed on
/// every `fetch()`. A scripted failure is yielded as `FetchError::Other`;
/// items after it are only produced if the caller keeps pulling.
#[derive(Debug, Default)]
pub struct MockGetter {
    items: Vec<Result<FetchBatch, String>>,
    item_delay: Option<Duration>,
    /// Items handed to consumers, across all fetches.
    yielded: Arc<AtomicUsize>,
    fetch_calls: AtomicUsize,
}

impl MockGetter {
    /// Create a getter that yields nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one batch with count 1 per record.
    pub fn with_records(mut self, records: Vec<serde_json::Value>) -> Self {
        self.items
            .extend(records.into_iter().map(|r| Ok(FetchBatch::single(r))));
        self
    }

    /// Append a batch with an explicit count.
    pub fn with_batch(mut self, payload: serde_json::Value, count: u64) -> Self {
        self.items.push(Ok(FetchBatch::new(payload, count)));
        self
    }

    /// Append a fatal fetch failure.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.items.push(Err(message.to_string()));
        self
    }

    /// Sleep before producing each item.
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = Some(delay);
        self
    }

    /// Number of items actually produced so far.
    pub fn yielded(&self) -> usize {
        self.yielded.load(Ordering::SeqCst)
    }

    /// Number of times `fetch()` was called.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl Getter for MockGetter {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch(&self) -> FetchStream {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let yielded = Arc::clone(&self.yielded);
        let delay = self.item_delay;

        stream::iter(self.items.clone())
            .then(move |item| {
                let yielded = Arc::clone(&yielded);
                async move {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    yielded.fetch_add(1, Ordering::SeqCst);
                    item.map_err(FetchError::Other)
                }
            })
            .boxed()
    }
}
