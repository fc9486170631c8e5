//! Ingestion and query metrics.

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

pub struct AnalyticsMetrics;

impl AnalyticsMetrics {
    pub fn record_event_ingested(event_type: &str) {
        counter!("events_ingested_total", "event_type" => event_type.to_string()).increment(1);
    }

    /// Record one read query. Failed queries also bump the error counter.
    pub fn record_query(query: &'static str, elapsed: Duration, succeeded: bool) {
        let outcome = if succeeded { "ok" } else { "error" };
        histogram!(
            "analytics_query_duration_seconds",
            "query" => query,
            "outcome" => outcome
        )
        .record(elapsed.as_secs_f64());

        if !succeeded {
            counter!("analytics_query_errors_total", "query" => query).increment(1);
        }

        tracing::debug!(
            query,
            outcome,
            duration_ms = elapsed.as_millis() as u64,
            "Analytics query finished"
        );
    }
}

/// Measures a query from construction until [`QueryTimer::finish`].
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn start(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    pub fn finish(self, succeeded: bool) -> Duration {
        let elapsed = self.start.elapsed();
        AnalyticsMetrics::record_query(self.query, elapsed, succeeded);
        elapsed
    }
}
