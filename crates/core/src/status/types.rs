//! Status document data types.
//!
//! A `StatusDocument` describes one import run. It is created when the
//! cycle is constructed, mutated while the run progresses, and persisted
//! to a `StatusStore` at the start and the end of the run.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// `import_type` tag carried by every per-record child entry.
pub const CHILD_IMPORT_TYPE: &str = "data_record";

/// Value of `NotifyStatus::function_index` when no ordinal was assigned.
pub const UNSET_FUNCTION_INDEX: i32 = -1;

/// Current UTC time truncated to whole seconds.
pub fn now_secs() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

// ============================================================================
// FetchStatus
// ============================================================================

/// Outcome of a run or of a single record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FetchStatus {
    Running,
    Success,
    Fail,
}

impl FetchStatus {
    /// Returns true for `Success` and `Fail`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchStatus::Success | FetchStatus::Fail)
    }

    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Running => "RUNNING",
            FetchStatus::Success => "SUCCESS",
            FetchStatus::Fail => "FAIL",
        }
    }

    /// Parses the storage representation, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "RUNNING" => Some(FetchStatus::Running),
            "SUCCESS" => Some(FetchStatus::Success),
            "FAIL" => Some(FetchStatus::Fail),
            _ => None,
        }
    }
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// StatusDocument
// ============================================================================

/// Run-level status record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusDocument {
    /// Unique run identifier (UUID v4).
    pub fetch_id: String,
    pub tenant_id: String,
    pub import_type: String,
    pub start_timestamp: DateTime<Utc>,
    /// Set when the run finishes.
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
    /// Sum of the record counts reported by the getter.
    #[serde(default)]
    pub total_records: u64,
    pub status: FetchStatus,
    /// Fatal fetch error, empty otherwise.
    #[serde(default)]
    pub error: String,
    /// Reserved for the caller; the engine never writes it.
    #[serde(default)]
    pub result: String,
    /// Per-record outcomes in completion order.
    #[serde(default)]
    pub child_imports: Vec<ChildStatus>,
    /// One entry per notify attempt.
    #[serde(default)]
    pub notify: Vec<NotifyStatus>,
}

impl StatusDocument {
    /// Creates a `RUNNING` document with a fresh `fetch_id`.
    pub fn new(import_type: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            fetch_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            import_type: import_type.into(),
            start_timestamp: now_secs(),
            end_timestamp: None,
            total_records: 0,
            status: FetchStatus::Running,
            error: String::new(),
            result: String::new(),
            child_imports: Vec::new(),
            notify: Vec::new(),
        }
    }

    /// Moves a running document to `Fail`. Returns false if it was already terminal.
    pub fn mark_failed(&mut self) -> bool {
        self.transition(FetchStatus::Fail)
    }

    /// Moves a running document to `Success`. Returns false if it was already terminal.
    pub fn mark_succeeded(&mut self) -> bool {
        self.transition(FetchStatus::Success)
    }

    fn transition(&mut self, to: FetchStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = to;
        true
    }

    /// Number of children that ended in `Fail`.
    pub fn failed_children(&self) -> usize {
        self.child_imports
            .iter()
            .filter(|c| c.status == FetchStatus::Fail)
            .count()
    }
}

// ============================================================================
// ChildStatus
// ============================================================================

/// Outcome of storing a single record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildStatus {
    pub start_timestamp: DateTime<Utc>,
    pub import_type: String,
    /// Parent run id.
    pub fetch_id: String,
    pub total_records: u64,
    pub tenant_id: String,
    pub status: FetchStatus,
    /// Value returned by the storer on success.
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: String,
}

impl ChildStatus {
    /// Starts a child entry for a record of the given run.
    pub fn start(fetch_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            start_timestamp: now_secs(),
            import_type: CHILD_IMPORT_TYPE.to_string(),
            fetch_id: fetch_id.into(),
            total_records: 1,
            tenant_id: tenant_id.into(),
            status: FetchStatus::Running,
            result: serde_json::Value::Null,
            error: String::new(),
        }
    }

    pub fn succeeded(mut self, result: serde_json::Value) -> Self {
        self.status = FetchStatus::Success;
        self.result = result;
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = FetchStatus::Fail;
        self.error = error.into();
        self
    }
}

// ============================================================================
// NotifyStatus
// ============================================================================

/// Outcome of one notify attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotifyStatus {
    /// Name of the notifier that was invoked.
    pub function: String,
    #[serde(default = "default_function_index")]
    pub function_index: i32,
    #[serde(default)]
    pub error: String,
}

fn default_function_index() -> i32 {
    UNSET_FUNCTION_INDEX
}

impl NotifyStatus {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            function_index: UNSET_FUNCTION_INDEX,
            error: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_running() {
        let doc = StatusDocument::new("vehicle", "tenant-1");
        assert_eq!(doc.status, FetchStatus::Running);
        assert_eq!(doc.total_records, 0);
        assert!(doc.end_timestamp.is_none());
        assert!(doc.child_imports.is_empty());
        assert!(doc.notify.is_empty());
        assert!(uuid::Uuid::parse_str(&doc.fetch_id).is_ok());
    }

    #[test]
    fn test_fetch_ids_are_unique() {
        let a = StatusDocument::new("vehicle", "t");
        let b = StatusDocument::new("vehicle", "t");
        assert_ne!(a.fetch_id, b.fetch_id);
    }

    #[test]
    fn test_terminal_status_never_reverts() {
        let mut doc = StatusDocument::new("vehicle", "t");
        assert!(doc.mark_failed());
        assert!(!doc.mark_succeeded());
        assert!(!doc.mark_failed());
        assert_eq!(doc.status, FetchStatus::Fail);

        let mut doc = StatusDocument::new("vehicle", "t");
        assert!(doc.mark_succeeded());
        assert!(!doc.mark_failed());
        assert_eq!(doc.status, FetchStatus::Success);
    }

    #[test]
    fn test_timestamps_have_second_precision() {
        let doc = StatusDocument::new("vehicle", "t");
        assert_eq!(doc.start_timestamp.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_child_status_outcomes() {
        let ok = ChildStatus::start("f1", "t1").succeeded(serde_json::json!({"status": 200}));
        assert_eq!(ok.status, FetchStatus::Success);
        assert_eq!(ok.import_type, CHILD_IMPORT_TYPE);
        assert_eq!(ok.total_records, 1);
        assert!(ok.error.is_empty());

        let bad = ChildStatus::start("f1", "t1").failed("boom");
        assert_eq!(bad.status, FetchStatus::Fail);
        assert_eq!(bad.error, "boom");
        assert!(bad.result.is_null());
    }

    #[test]
    fn test_status_serializes_upper_case() {
        let json = serde_json::to_string(&FetchStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
        assert_eq!(FetchStatus::parse("fail"), Some(FetchStatus::Fail));
        assert_eq!(FetchStatus::parse("bogus"), None);
    }

    #[test]
    fn test_notify_status_defaults() {
        let n = NotifyStatus::new("webhook");
        assert_eq!(n.function_index, UNSET_FUNCTION_INDEX);

        let parsed: NotifyStatus = serde_json::from_str(r#"{"function":"noop"}"#).unwrap();
        assert_eq!(parsed.function_index, -1);
        assert!(parsed.error.is_empty());
    }
}
