// Prometheus metrics definitions for the LoL Court backend.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Verdicts issued by the keyword-rule analyzer, by verdict label.
    pub static ref VERDICTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lolcourt_verdicts_total", "Verdicts issued"),
        &["verdict"],
    )
    .unwrap();

    /// Fault estimates, by judgment.
    pub static ref FAULT_ESTIMATES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lolcourt_fault_estimates_total", "Fault estimates computed"),
        &["judgment"],
    )
    .unwrap();

    /// Replays analyzed, by source (parsed or fallback).
    pub static ref REPLAYS_ANALYZED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lolcourt_replays_analyzed_total", "Replays analyzed"),
        &["source"],
    )
    .unwrap();

    /// Reward-table learning updates.
    pub static ref LEARNING_UPDATES_TOTAL: IntCounter = IntCounter::new(
        "lolcourt_learning_updates_total",
        "Reward table learning updates",
    )
    .unwrap();

    /// Mock payments recorded.
    pub static ref PAYMENTS_TOTAL: IntCounter = IntCounter::new(
        "lolcourt_payments_total",
        "Mock payments recorded",
    )
    .unwrap();

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("lolcourt_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Uploaded replay size in bytes.
    pub static ref REPLAY_UPLOAD_BYTES: Histogram = Histogram::with_opts(
        HistogramOpts::new("lolcourt_replay_upload_bytes", "Uploaded replay size in bytes")
            .buckets(prometheus::exponential_buckets(1024.0, 4.0, 10).unwrap()),
    )
    .unwrap();

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "lolcourt_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(VERDICTS_TOTAL.clone()),
        Box::new(FAULT_ESTIMATES_TOTAL.clone()),
        Box::new(REPLAYS_ANALYZED_TOTAL.clone()),
        Box::new(LEARNING_UPDATES_TOTAL.clone()),
        Box::new(PAYMENTS_TOTAL.clone()),
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(REPLAY_UPLOAD_BYTES.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("metric registration skipped: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Normalize a URL path for metric labels: replace numeric and UUID path
/// segments with `:id` to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() || uuid::Uuid::parse_str(segment).is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
