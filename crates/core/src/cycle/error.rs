//! Error types for the import cycle and its collaborators.

use thiserror::Error;

/// Fatal failure of the getter. Stops the fetch loop and fails the run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source could not be reached.
    #[error("Source request failed: {0}")]
    Request(String),

    /// The source answered with an unexpected status.
    #[error("Source returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// The source body could not be turned into records.
    #[error("Failed to decode source data: {0}")]
    Decode(String),

    /// The getter yielded a null payload, which it uses to signal failure.
    #[error("Getter yielded an empty payload")]
    EmptyPayload,

    #[error("{0}")]
    Other(String),
}

/// Failure to store a single record. Fails the record and the run, never the pipeline.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Request(String),

    /// The record store answered with a status outside the accepted set.
    #[error("Store rejected record with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Store panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// Failure of the completion notification. Recorded, never propagated.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notify request failed: {0}")]
    Request(String),

    #[error("Notify endpoint returned status {status}")]
    Rejected { status: u16 },

    #[error("Notifier panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Request(error_chain(&e))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Request(error_chain(&e))
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Request(error_chain(&e))
    }
}

/// Renders an error followed by each of its sources, separated by ": ".
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
