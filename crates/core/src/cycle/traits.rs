//! Collaborator traits driven by the import cycle.

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::error::{FetchError, NotifyError, StoreError};
use crate::status::StatusDocument;

/// One item produced by a getter: a payload and how many records it counts for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchBatch {
    pub payload: serde_json::Value,
    pub count: u64,
}

impl FetchBatch {
    pub fn new(payload: serde_json::Value, count: u64) -> Self {
        Self { payload, count }
    }

    /// A batch holding a single record.
    pub fn single(payload: serde_json::Value) -> Self {
        Self::new(payload, 1)
    }
}

/// Lazy, finite sequence of batches. An `Err` item is fatal to the run.
pub type FetchStream = BoxStream<'static, Result<FetchBatch, FetchError>>;

/// Source of records for a run.
pub trait Getter: Send + Sync {
    /// Returns the name of this getter implementation.
    fn name(&self) -> &str;

    /// Opens the record stream. Each call starts a new, non-restartable pass.
    fn fetch(&self) -> FetchStream;
}

/// Persists one record.
#[async_trait]
pub trait Storer: Send + Sync {
    /// Returns the name of this storer implementation.
    fn name(&self) -> &str;

    /// Stores `payload` on behalf of the run `fetch_id` and returns the store's result.
    async fn store(
        &self,
        payload: serde_json::Value,
        fetch_id: &str,
    ) -> Result<serde_json::Value, StoreError>;
}

/// Receives the final status document of a run.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the name of this notifier implementation.
    fn name(&self) -> &str;

    async fn notify(&self, document: &StatusDocument) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    struct VecGetter(Vec<serde_json::Value>);

    impl Getter for VecGetter {
        fn name(&self) -> &str {
            "vec"
        }

        fn fetch(&self) -> FetchStream {
            let items: Vec<_> = self.0.iter().cloned().map(|v| Ok(FetchBatch::single(v))).collect();
            futures::stream::iter(items).boxed()
        }
    }

    struct EchoStorer;

    #[async_trait]
    impl Storer for EchoStorer {
        fn name(&self) -> &str {
            "echo"
        }

        async fn store(
            &self,
            payload: serde_json::Value,
            fetch_id: &str,
        ) -> Result<serde_json::Value, StoreError> {
            Ok(serde_json::json!({ "fetch_id": fetch_id, "payload": payload }))
        }
    }

    #[tokio::test]
    async fn test_getter_stream_yields_batches() {
        let getter = VecGetter(vec![serde_json::json!(1), serde_json::json!(2)]);
        let batches: Vec<_> = getter.fetch().collect().await;
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].as_ref().unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_storer_receives_fetch_id() {
        let result = EchoStorer
            .store(serde_json::json!({"id": 7}), "fetch-1")
            .await
            .unwrap();
        assert_eq!(result["fetch_id"], "fetch-1");
        assert_eq!(result["payload"]["id"], 7);
    }
}
