//! Service metrics
//!
//! The orchestrator and the HTTP middleware record through [`RecipeMetrics`].
//! [`PrometheusMetrics`] forwards to the `metrics` facade; the recorder installed
//! by [`install_prometheus`] renders everything at `GET /metrics`.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use recipe_common::Error;

use crate::service::Stage;

pub const AGGREGATIONS_TOTAL: &str = "recipe_manager_aggregations_total";
pub const AGGREGATION_DURATION: &str = "recipe_manager_aggregation_duration_seconds";
pub const AGGREGATION_ERRORS_TOTAL: &str = "recipe_manager_aggregation_errors_total";
pub const STAGE_CALLS_TOTAL: &str = "recipe_manager_stage_calls_total";
pub const STAGE_DURATION: &str = "recipe_manager_stage_duration_seconds";
pub const HTTP_REQUESTS_TOTAL: &str = "recipe_manager_http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "recipe_manager_http_request_duration_seconds";

/// Histogram buckets for every `*_duration_seconds` metric
const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Endpoint label for requests no route matched
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Sink for service measurements
///
/// `error` is `None` on success; failures are labelled with [`Error::code`].
pub trait RecipeMetrics: Send + Sync {
    /// One orchestration stage (calculator, database, balancer)
    fn record_stage(&self, stage: Stage, elapsed: Duration, error: Option<&Error>);

    /// One whole aggregation, from pan resolution to the balanced recipe
    fn record_aggregation(&self, elapsed: Duration, error: Option<&Error>);

    /// One HTTP request; `endpoint` is the route template
    fn record_http_request(
        &self,
        method: &Method,
        endpoint: &str,
        status: StatusCode,
        elapsed: Duration,
    );
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl RecipeMetrics for NoopMetrics {
    fn record_stage(&self, _stage: Stage, _elapsed: Duration, _error: Option<&Error>) {}

    fn record_aggregation(&self, _elapsed: Duration, _error: Option<&Error>) {}

    fn record_http_request(
        &self,
        _method: &Method,
        _endpoint: &str,
        _status: StatusCode,
        _elapsed: Duration,
    ) {
    }
}

/// Records through the `metrics` facade
#[derive(Debug, Clone, Copy)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    /// Register metric descriptions with the installed recorder
    pub fn new() -> Self {
        describe_counter!(AGGREGATIONS_TOTAL, "Recipe aggregations by outcome");
        describe_histogram!(
            AGGREGATION_DURATION,
            Unit::Seconds,
            "Duration of recipe aggregations"
        );
        describe_counter!(AGGREGATION_ERRORS_TOTAL, "Failed aggregations by error type");
        describe_counter!(STAGE_CALLS_TOTAL, "Orchestration stage calls by outcome");
        describe_histogram!(
            STAGE_DURATION,
            Unit::Seconds,
            "Duration of orchestration stage calls"
        );
        describe_counter!(HTTP_REQUESTS_TOTAL, "HTTP requests by endpoint and status");
        describe_histogram!(
            HTTP_REQUEST_DURATION,
            Unit::Seconds,
            "Duration of HTTP requests"
        );
        Self
    }
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn outcome(error: Option<&Error>) -> &'static str {
    error.map_or("ok", Error::code)
}

impl RecipeMetrics for PrometheusMetrics {
    fn record_stage(&self, stage: Stage, elapsed: Duration, error: Option<&Error>) {
        counter!(STAGE_CALLS_TOTAL, "stage" => stage.metric_label(), "outcome" => outcome(error))
            .increment(1);
        histogram!(STAGE_DURATION, "stage" => stage.metric_label()).record(elapsed.as_secs_f64());
    }

    fn record_aggregation(&self, elapsed: Duration, error: Option<&Error>) {
        counter!(AGGREGATIONS_TOTAL, "outcome" => if error.is_some() { "error" } else { "ok" })
            .increment(1);
        histogram!(AGGREGATION_DURATION).record(elapsed.as_secs_f64());
        if let Some(err) = error {
            counter!(AGGREGATION_ERRORS_TOTAL, "error_type" => err.code()).increment(1);
        }
    }

    fn record_http_request(
        &self,
        method: &Method,
        endpoint: &str,
        status: StatusCode,
        elapsed: Duration,
    ) {
        counter!(
            HTTP_REQUESTS_TOTAL,
            "method" => method.as_str().to_string(),
            "endpoint" => endpoint.to_string(),
            "status_code" => status.as_u16().to_string()
        )
        .increment(1);
        histogram!(
            HTTP_REQUEST_DURATION,
            "method" => method.as_str().to_string(),
            "endpoint" => endpoint.to_string()
        )
        .record(elapsed.as_secs_f64());
    }
}

/// Install the process-wide Prometheus recorder
///
/// Fails if a global recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            DURATION_BUCKETS,
        )?
        .install_recorder()
}
