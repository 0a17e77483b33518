//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Import cycles (runs by final status, run duration)
//! - Fetching (records reported, fatal getter failures)
//! - Storing (records by outcome, store duration, stores in flight)
//! - Notification (attempts by outcome)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Cycle Metrics
// =============================================================================

/// Finished import cycles by final status.
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchcycle_cycles_total", "Total finished import cycles"),
        &["status"], // "SUCCESS", "FAIL"
    )
    .unwrap()
});

/// Import cycle duration in seconds.
pub static CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetchcycle_cycle_duration_seconds",
            "Duration of a whole import cycle",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 3600.0]),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Fetch Metrics
// =============================================================================

/// Records reported by getters (sum of batch counts).
pub static RECORDS_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetchcycle_records_fetched_total",
        "Total records reported by getters",
    )
    .unwrap()
});

/// Fatal getter failures.
pub static FETCH_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetchcycle_fetch_failures_total",
        "Getter failures that aborted a cycle",
    )
    .unwrap()
});

// =============================================================================
// Store Metrics
// =============================================================================

/// Stored records by outcome.
pub static RECORDS_STORED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchcycle_records_stored_total", "Total store operations"),
        &["result"], // "success", "fail"
    )
    .unwrap()
});

/// Store operation duration in seconds.
pub static STORE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetchcycle_store_duration_seconds",
            "Duration of a single store operation",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

/// Store operations currently in flight across all cycles.
pub static STORES_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchcycle_stores_in_flight",
        "Number of store operations currently running",
    )
    .unwrap()
});

// =============================================================================
// Notify Metrics
// =============================================================================

/// Notify attempts by outcome.
pub static NOTIFY_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchcycle_notify_attempts_total", "Total notify attempts"),
        &["result"], // "success", "fail"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Cycles
        Box::new(CYCLES_TOTAL.clone()),
        Box::new(CYCLE_DURATION.clone()),
        // Fetch
        Box::new(RECORDS_FETCHED.clone()),
        Box::new(FETCH_FAILURES.clone()),
        // Store
        Box::new(RECORDS_STORED.clone()),
        Box::new(STORE_DURATION.clone()),
        Box::new(STORES_IN_FLIGHT.clone()),
        // Notify
        Box::new(NOTIFY_ATTEMPTS.clone()),
    ]
}
