//! Prometheus metrics for the prediction request path.
//!
//! The gateway exports three metric families:
//! - `predictions_total{result=...}` - finished requests by outcome
//! - `predict_requests_in_flight` - currently executing requests
//! - `predict_request_duration_seconds` - request latency histogram
//!
//! All request accounting goes through [`RequestGuard`], whose `Drop` impl is
//! the single place a request is finished. A request is therefore booked
//! exactly once on every exit path, including early returns and panics.

use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Finished predictions counter metric name, labeled by outcome.
pub const METRIC_PREDICTIONS: &str = "predictions_total";
/// In-flight prediction requests gauge metric name.
pub const METRIC_REQUESTS_IN_FLIGHT: &str = "predict_requests_in_flight";
/// Prediction request latency histogram metric name.
pub const METRIC_REQUEST_DURATION: &str = "predict_request_duration_seconds";

/// Outcome label recorded when a request fails for any reason.
pub const OUTCOME_ERROR: &str = "error";

/// Latency histogram buckets in seconds, tuned for an in-process classifier.
const DURATION_BUCKETS: &[f64] = &[
    0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(
        METRIC_PREDICTIONS,
        "Total number of finished prediction requests by outcome"
    );
    describe_gauge!(
        METRIC_REQUESTS_IN_FLIGHT,
        "Number of prediction requests currently executing"
    );
    describe_histogram!(
        METRIC_REQUEST_DURATION,
        "Prediction request latency in seconds"
    );

    debug!("Metrics initialized");
}

/// Install the process-wide Prometheus recorder and return its render handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(METRIC_REQUEST_DURATION.to_string()),
            DURATION_BUCKETS,
        )?
        .install_recorder()?;

    init_metrics();
    Ok(handle)
}

/// Start tracking one prediction request.
///
/// Increments the in-flight gauge immediately; the returned guard finishes
/// the request when it goes out of scope.
pub fn begin_request() -> RequestGuard {
    gauge!(METRIC_REQUESTS_IN_FLIGHT).increment(1.0);
    RequestGuard {
        start: Instant::now(),
        outcome: OUTCOME_ERROR,
    }
}

/// RAII guard for one in-flight prediction request.
///
/// Until [`complete`](Self::complete) is called the outcome stays `error`, so
/// a guard dropped by an early return or a panic still books the request and
/// releases the gauge.
pub struct RequestGuard {
    start: Instant,
    outcome: &'static str,
}

impl RequestGuard {
    /// Finish the request with the given outcome label.
    pub fn complete(mut self, outcome: &'static str) {
        self.outcome = outcome;
    }

    /// Elapsed time since the request began (without recording).
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        counter!(METRIC_PREDICTIONS, "result" => self.outcome).increment(1);
        histogram!(METRIC_REQUEST_DURATION).record(self.start.elapsed().as_secs_f64());
        gauge!(METRIC_REQUESTS_IN_FLIGHT).decrement(1.0);
    }
}
