//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the pixpress server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Core metrics (executions, probes, conversions), registered from
//!   `pixpress_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, core::Collector, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

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
            "pixpress_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 120.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pixpress_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "pixpress_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let http: Vec<Box<dyn Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
    ];

    // Core metrics (executor, capabilities, converter)
    for metric in http.into_iter().chain(pixpress_core::metrics::all_metrics()) {
        if let Err(e) = registry.register(metric) {
            warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_PATTERN.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
