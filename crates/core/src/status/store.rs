//! Status storage trait and query types.

use thiserror::Error;

use super::{FetchStatus, StatusDocument};

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Status document not found: {0}")]
    NotFound(String),

    #[error("Status document already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Filter for listing status documents.
#[derive(Debug, Clone, Default)]
pub struct StatusFilter {
    pub tenant_id: Option<String>,
    pub status: Option<FetchStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl StatusFilter {
    pub fn new() -> Self {
        Self {
            limit: 100,
            offset: 0,
            ..Default::default()
        }
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_status(mut self, status: FetchStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Durable storage for status documents, keyed by `fetch_id`.
pub trait StatusStore: Send + Sync {
    /// Store a new document. Fails if the id is already present.
    fn insert(&self, document: &StatusDocument) -> Result<(), StatusError>;

    /// Replace an existing document. Fails if the id is unknown.
    fn update(&self, document: &StatusDocument) -> Result<(), StatusError>;

    /// Get a document by `fetch_id`.
    fn get(&self, fetch_id: &str) -> Result<Option<StatusDocument>, StatusError>;

    /// List documents, newest first.
    fn list(&self, filter: &StatusFilter) -> Result<Vec<StatusDocument>, StatusError>;

    /// Count documents matching the filter (ignores limit/offset).
    fn count(&self, filter: &StatusFilter) -> Result<i64, StatusError>;
}
