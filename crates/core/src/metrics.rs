//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Subprocess executions (per binary, by outcome)
//! - Capability probes
//! - Conversions and bytes saved

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};
use std::time::Duration;

// =============================================================================
// Executor Metrics
// =============================================================================

/// Binary executions total by binary and result.
pub static BINARY_EXECUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pixpress_binary_executions_total",
            "Total external binary executions",
        ),
        &["binary", "result"], // "success", "failure", "timeout", "spawn_failed"
    )
    .unwrap()
});

/// Binary execution duration in seconds.
pub static BINARY_EXECUTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pixpress_binary_execution_duration_seconds",
            "Wall-clock duration of external binary executions",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["binary"],
    )
    .unwrap()
});

// =============================================================================
// Capability Metrics
// =============================================================================

/// Capability probes total by encoder and availability.
pub static CAPABILITY_PROBES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pixpress_capability_probes_total",
            "Total encoder capability probes",
        ),
        &["encoder", "available"],
    )
    .unwrap()
});

// =============================================================================
// Converter Metrics
// =============================================================================

/// Conversions total by operation and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pixpress_conversions_total", "Total image conversions"),
        &["operation", "result"], // "success", "failure"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pixpress_conversion_duration_seconds",
            "Duration of image conversions",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["operation"],
    )
    .unwrap()
});

/// Bytes saved by successful conversions.
pub static BYTES_SAVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pixpress_bytes_saved_total",
            "Total bytes saved by image conversions",
        ),
        &["operation"],
    )
    .unwrap()
});

pub(crate) fn record_execution(binary: &str, result: &str, elapsed: Duration) {
    BINARY_EXECUTIONS.with_label_values(&[binary, result]).inc();
    BINARY_EXECUTION_DURATION
        .with_label_values(&[binary])
        .observe(elapsed.as_secs_f64());
}

pub(crate) fn record_probe(encoder: &str, available: bool) {
    let available = if available { "true" } else { "false" };
    CAPABILITY_PROBES
        .with_label_values(&[encoder, available])
        .inc();
}

pub(crate) fn record_conversion(operation: &str, success: bool, saved: i64, elapsed: Duration) {
    let result = if success { "success" } else { "failure" };
    CONVERSIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
    CONVERSION_DURATION
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
    if success && saved > 0 {
        BYTES_SAVED
            .with_label_values(&[operation])
            .inc_by(saved as u64);
    }
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Executor
        Box::new(BINARY_EXECUTIONS.clone()),
        Box::new(BINARY_EXECUTION_DURATION.clone()),
        // Capabilities
        Box::new(CAPABILITY_PROBES.clone()),
        // Converter
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(BYTES_SAVED.clone()),
    ]
}
