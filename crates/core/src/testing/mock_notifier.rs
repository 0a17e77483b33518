//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cycle::{NotifyError, Notifier};
use crate::status::StatusDocument;

/// Mock implementation of the Notifier trait.
///
/// Records every document it is handed, can fail once with a configured
/// error or panic on every call.
#[derive(Debug)]
pub struct MockNotifier {
    documents: Arc<RwLock<Vec<StatusDocument>>>,
    next_error: Arc<RwLock<Option<NotifyError>>>,
    panic: Arc<RwLock<bool>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    /// Create a new mock notifier that always succeeds.
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            panic: Arc::new(RwLock::new(false)),
        }
    }

    /// Get the documents passed to `notify`, in call order.
    pub async fn notified_documents(&self) -> Vec<StatusDocument> {
        self.documents.read().await.clone()
    }

    /// Configure the next notification to fail with the given error.
    pub async fn set_next_error(&self, error: NotifyError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every notification panic.
    pub async fn set_panic(&self, panic: bool) {
        *self.panic.write().await = panic;
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn notify(&self, document: &StatusDocument) -> Result<(), NotifyError> {
        self.documents.write().await.push(document.clone());

        if *self.panic.read().await {
            panic!("mock notifier panic for {}", document.fetch_id);
        }

        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
