//! Metrics collection and exposition.
//!
//! # Metrics
//! - `backend_requests_total` (counter): requests by path, method
//! - `backend_request_duration_seconds` (histogram): latency by path, method, status
//! - `process_*`: CPU time, resident/virtual memory, open fds, start time,
//!   sampled on every scrape
//!
//! The recorder is process-global; `/metrics` renders the exporter stored in
//! `AppState`.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;

pub const REQUESTS_TOTAL: &str = "backend_requests_total";
pub const REQUEST_DURATION: &str = "backend_request_duration_seconds";

/// Renders request metrics plus process statistics in Prometheus format.
#[derive(Clone)]
pub struct MetricsExporter {
    handle: PrometheusHandle,
    process: Arc<Collector>,
}

impl MetricsExporter {
    /// Refresh process statistics and render every series.
    pub fn render(&self) -> String {
        self.process.collect();
        self.handle.render()
    }
}

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<MetricsExporter, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Total HTTP requests to backend");
    metrics::describe_histogram!(
        REQUEST_DURATION,
        metrics::Unit::Seconds,
        "HTTP request latency"
    );

    let process = Collector::default();
    process.describe();

    Ok(MetricsExporter {
        handle,
        process: Arc::new(process),
    })
}

/// Count a request as it arrives.
pub fn record_request(path: &str, method: &str) {
    counter!(REQUESTS_TOTAL, "path" => path.to_string(), "method" => method.to_string())
        .increment(1);
}

/// Record how long a request took once its response is ready.
pub fn record_duration(path: &str, method: &str, status: u16, start: Instant) {
    histogram!(
        REQUEST_DURATION,
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
