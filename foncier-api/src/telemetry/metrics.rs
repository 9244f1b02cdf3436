//! Prometheus Metrics Definitions
//!
//! Registry metrics with their labels, and the /metrics scrape endpoint.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, Encoder,
    HistogramVec, IntCounter, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<FoncierMetrics>> = Lazy::new(FoncierMetrics::new);

static METRICS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn metric recording on or off process-wide.
pub fn set_metrics_enabled(enabled: bool) {
    METRICS_ENABLED.store(enabled, Ordering::Relaxed);
}

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

/// Container for all registry metrics.
#[derive(Clone)]
pub struct FoncierMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Parcel updates - labels: outcome (changed/unchanged)
    pub parcel_updates_total: CounterVec,

    /// Stored document files
    pub documents_uploaded_total: IntCounter,

    /// Bytes written to the upload directory
    pub upload_bytes_total: IntCounter,

    /// Synthetic rows created by the seed endpoint - labels: entity
    pub seeded_records_total: CounterVec,
}

impl FoncierMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "foncier_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "foncier_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            parcel_updates_total: register_counter_vec!(
                "foncier_parcel_updates_total",
                "Parcel update requests by outcome",
                &["outcome"]
            )
            .map_err(|e| registration_error("parcel_updates_total", e))?,

            documents_uploaded_total: register_int_counter!(
                "foncier_documents_uploaded_total",
                "Total number of stored parcel documents"
            )
            .map_err(|e| registration_error("documents_uploaded_total", e))?,

            upload_bytes_total: register_int_counter!(
                "foncier_upload_bytes_total",
                "Total bytes of stored parcel documents"
            )
            .map_err(|e| registration_error("upload_bytes_total", e))?,

            seeded_records_total: register_counter_vec!(
                "foncier_seeded_records_total",
                "Synthetic records created by the seed endpoint",
                &["entity"]
            )
            .map_err(|e| registration_error("seeded_records_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record whether a parcel update changed anything.
    pub fn record_parcel_update(&self, changed: bool) {
        let outcome = if changed { "changed" } else { "unchanged" };
        self.parcel_updates_total.with_label_values(&[outcome]).inc();
    }

    /// Record one stored document.
    pub fn record_upload(&self, size_bytes: u64) {
        self.documents_uploaded_total.inc();
        self.upload_bytes_total.inc_by(size_bytes);
    }

    pub fn record_seeded(&self, entity: &str, count: usize) {
        self.seeded_records_total
            .with_label_values(&[entity])
            .inc_by(count as f64);
    }
}

/// Run `f` against the global metrics if recording is on and they registered.
pub fn with_metrics(f: impl FnOnce(&FoncierMetrics)) {
    if !METRICS_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
))]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
