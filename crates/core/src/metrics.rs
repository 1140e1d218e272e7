//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job state transitions and rejected submissions
//! - Ingest (bytes staged) and cleanup (bytes reclaimed)
//! - Engine runs (outcome, duration)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// State transitions published, by target state.
pub static JOB_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidstage_job_transitions_total",
            "Total job state transitions published",
        ),
        &["state"], // "ingesting", "staged", "transcoding", "succeeded", "failed"
    )
    .unwrap()
});

/// Submissions rejected synchronously, by reason.
pub static SUBMISSIONS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidstage_submissions_rejected_total",
            "Total submissions rejected without starting work",
        ),
        &["reason"], // "already_busy", "not_staged", "storage_unavailable"
    )
    .unwrap()
});

// =============================================================================
// Ingest Metrics
// =============================================================================

/// Bytes copied into the staged slot by successful ingests.
pub static BYTES_STAGED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("vidstage_bytes_staged_total", "Total bytes staged").unwrap()
});

/// Bytes freed by deleting staged files after transcode.
pub static BYTES_RECLAIMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidstage_bytes_reclaimed_total",
        "Total bytes reclaimed by staged file cleanup",
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics
// =============================================================================

/// Engine invocations by outcome.
pub static ENGINE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidstage_engine_runs_total", "Total engine invocations"),
        &["outcome"], // "success", "failure"
    )
    .unwrap()
});

/// Engine wall-clock duration in seconds.
pub static TRANSCODE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "vidstage_transcode_duration_seconds",
            "Duration of engine invocations",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
    )
    .unwrap()
});

/// All core metrics, for registration by the embedding process.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOB_TRANSITIONS.clone()),
        Box::new(SUBMISSIONS_REJECTED.clone()),
        Box::new(BYTES_STAGED.clone()),
        Box::new(BYTES_RECLAIMED.clone()),
        Box::new(ENGINE_RUNS.clone()),
        Box::new(TRANSCODE_DURATION.clone()),
    ]
}
