use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Instant;

use crate::{MetricsError, Result};

lazy_static! {
    // Backend metrics
    pub static ref BACKEND_QUERIES: IntCounter = register_int_counter!(
        "backend_queries_total",
        "Total number of queries sent to the time-series backend"
    ).unwrap();

    pub static ref BACKEND_QUERY_FAILURES: IntCounterVec = register_int_counter_vec!(
        "backend_query_failures_total",
        "Total number of failed backend queries by failure kind",
        &["kind"]
    ).unwrap();

    pub static ref BACKEND_QUERY_DURATION: Histogram = register_histogram!(
        "backend_query_duration_seconds",
        "Backend query duration in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]
    ).unwrap();

    // Summary metrics
    pub static ref SUMMARIES: IntCounter = register_int_counter!(
        "summaries_total",
        "Total number of integration summaries requested"
    ).unwrap();
}

/// Counts a backend query on creation and records its duration on drop.
pub struct QueryTimer {
    start: Instant,
}

impl QueryTimer {
    pub fn new() -> Self {
        BACKEND_QUERIES.inc();
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for QueryTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        BACKEND_QUERY_DURATION.observe(duration);
    }
}

pub fn record_query_failure(err: &MetricsError) {
    BACKEND_QUERY_FAILURES.with_label_values(&[err.kind()]).inc();
}

pub fn record_summary() {
    SUMMARIES.inc();
}

/// Renders every registered metric in the Prometheus text format.
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| MetricsError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| MetricsError::Internal(format!("Metrics are not valid UTF-8: {}", e)))
}
