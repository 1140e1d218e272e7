//! Prometheus registry for the control server.
//!
//! Request and status-feed metrics live here; job metrics come from
//! `vidstage_core::metrics` and are registered alongside them.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use tracing::error;

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
            "vidstage_http_request_duration_seconds",
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
        Opts::new("vidstage_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

// =============================================================================
// Status Feed Metrics
// =============================================================================

/// Clients currently subscribed to the status feed.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidstage_ws_connections_active",
        "Status feed clients currently connected",
    )
    .unwrap()
});

/// Status feed connections since startup.
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidstage_ws_connections_total",
        "Status feed connections since startup",
    )
    .unwrap()
});

/// Feed messages sent, by message type (`job_status`, `lagged`).
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidstage_ws_messages_sent_total",
            "Status feed messages sent to clients",
        ),
        &["type"],
    )
    .unwrap()
});

/// Times a feed client fell behind and skipped job events.
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidstage_ws_lag_events_total",
        "Status feed clients that fell behind the job",
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

    // Status feed
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Core metrics (job transitions, ingest, engine)
    for metric in vidstage_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Routes reported under their own label; anything else is "other".
const KNOWN_PATHS: &[&str] = &[
    "/api/v1/health",
    "/api/v1/config",
    "/api/v1/job",
    "/api/v1/job/selection",
    "/api/v1/job/transcode",
    "/api/v1/storage/access",
    "/api/v1/ws",
    "/metrics",
];

/// Normalize a path for metric labels, bounding label cardinality.
pub fn normalize_path(path: &str) -> String {
    let trimmed = match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    };
    if KNOWN_PATHS.contains(&trimmed) {
        trimmed.to_string()
    } else {
        "other".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_known() {
        assert_eq!(normalize_path("/api/v1/job"), "/api/v1/job");
        assert_eq!(normalize_path("/api/v1/job/"), "/api/v1/job");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }

    #[test]
    fn test_normalize_path_unknown() {
        assert_eq!(normalize_path("/api/v1/jobs/12345"), "other");
        assert_eq!(normalize_path("/"), "other");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("vidstage_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        vidstage_core::metrics::JOB_TRANSITIONS
            .with_label_values(&["staged"])
            .inc();
        vidstage_core::metrics::BYTES_STAGED.inc_by(0);
        WS_CONNECTIONS_ACTIVE.set(0);

        let output = encode_metrics();
        assert!(output.contains("vidstage_job_transitions_total"));
        assert!(output.contains("vidstage_bytes_staged_total"));
        assert!(output.contains("vidstage_ws_connections_active"));
    }
}
