//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the fetchcycle server:
//! - HTTP request metrics (latency, counts)
//! - Import runs (started, active, stored documents by status)
//! - Core cycle metrics, registered from `fetchcycle_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

use fetchcycle_core::{FetchStatus, StatusFilter, StatusStore};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetchcycle_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchcycle_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchcycle_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Import Metrics
// =============================================================================

/// Imports started through the API.
pub static IMPORTS_STARTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetchcycle_imports_started_total",
        "Total imports started through the API",
    )
    .unwrap()
});

/// Imports currently running in this process.
pub static IMPORTS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchcycle_imports_active",
        "Number of imports currently running",
    )
    .unwrap()
});

/// Import start requests by outcome.
pub static IMPORT_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fetchcycle_import_requests_total",
            "Import start requests by outcome",
        ),
        &["outcome"], // "accepted", "unavailable", "rejected", "error"
    )
    .unwrap()
});

/// Stored status documents by status (collected dynamically).
pub static DOCUMENTS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "fetchcycle_documents_by_status",
            "Stored status documents by status",
        ),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Imports
    registry
        .register(Box::new(IMPORTS_STARTED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(IMPORTS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(IMPORT_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(DOCUMENTS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (cycles, fetch, store, notify)
    for metric in fetchcycle_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the document gauges reflect the status store.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    for status in [FetchStatus::Running, FetchStatus::Success, FetchStatus::Fail] {
        let filter = StatusFilter::new().with_status(status);
        if let Ok(count) = state.status_store().count(&filter) {
            DOCUMENTS_BY_STATUS
                .with_label_values(&[status.as_str()])
                .set(count);
        }
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();
    let fetch_id_regex = regex_lite::Regex::new(r"^(/api/v1/imports/status/)[^/]+$").unwrap();
    let tenant_regex = regex_lite::Regex::new(r"^(/api/v1/imports/)([^/{}]+)$").unwrap();

    let result = fetch_id_regex.replace(path, "${1}{fetch_id}");
    let result = uuid_regex.replace_all(&result, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    let result = tenant_regex.replace(&result, "${1}{tenant_id}");
    result.to_string()
}
