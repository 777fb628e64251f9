//! Prometheus metrics for post-service.
//!
//! Exposes post/feed collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Duration;

/// Post lifecycle operations by outcome (ok, or the error code).
static POST_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "post_operations_total",
        "Post create/edit/delete operations segmented by outcome",
        &["operation", "result"]
    )
    .expect("failed to register post_operations_total")
});

/// Stale image removals after a committed edit or delete.
static FILE_CLEANUP_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "post_file_cleanup_total",
        "Stale post file removals segmented by result",
        &["result"]
    )
    .expect("failed to register post_file_cleanup_total")
});

/// Feed query latency by sort order.
static FEED_QUERY_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "feed_query_duration_seconds",
        "Feed query duration segmented by sort order",
        &["sort"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("failed to register feed_query_duration_seconds")
});

/// HTTP request latency by method and status.
static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register http_request_duration_seconds")
});

pub fn record_post_operation(operation: &str, result: &str) {
    POST_OPERATIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}

pub fn record_file_cleanup(result: &str) {
    FILE_CLEANUP_TOTAL.with_label_values(&[result]).inc();
}

/// Current value of the cleanup counter for `result`.
pub fn file_cleanup_count(result: &str) -> u64 {
    FILE_CLEANUP_TOTAL.with_label_values(&[result]).get()
}

pub fn record_feed_query(sort: &str, duration: Duration) {
    FEED_QUERY_DURATION_SECONDS
        .with_label_values(&[sort])
        .observe(duration.as_secs_f64());
}

pub fn record_http_request(method: &str, status: u16, duration: Duration) {
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, &status.to_string()])
        .observe(duration.as_secs_f64());
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
