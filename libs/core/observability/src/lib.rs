//! Prometheus metrics for the analytics service.
//!
//! - a process-wide recorder installed by [`init_metrics`]
//! - [`AnalyticsMetrics`] for ingestion and query instrumentation
//! - [`middleware::metrics_middleware`] for per-route HTTP metrics
//!
//! ```rust,ignore
//! use axum::{middleware, routing::get, Router};
//! use observability::{init_metrics, metrics_handler, middleware::metrics_middleware};
//!
//! init_metrics()?;
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler))
//!     .layer(middleware::from_fn(metrics_middleware));
//! ```
//!
//! Recording before [`init_metrics`] is a no-op, so library code and tests can
//! call the recorders unconditionally.

pub mod analytics;
pub mod middleware;

pub use analytics::{AnalyticsMetrics, QueryTimer};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder once and return its handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;
        register_metric_descriptions();
        info!("Prometheus metrics recorder initialized");
        Ok(handle)
    })
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for `GET /metrics`
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "events_ingested_total",
        "Events accepted by the ingestion endpoint, by event type"
    );
    describe_histogram!(
        "analytics_query_duration_seconds",
        "Duration of analytics read queries in seconds"
    );
    describe_counter!(
        "analytics_query_errors_total",
        "Analytics read queries that failed at the storage layer"
    );
}
