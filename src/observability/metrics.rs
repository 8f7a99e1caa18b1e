//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (requests, validation failures, handler latency)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `openapi_router_requests_total` (counter): requests by method, route, status
//! - `openapi_router_validation_failures_total` (counter): 422s by request part
//! - `openapi_router_handler_duration_seconds` (histogram): dispatch latency
//!
//! # Design Decisions
//! - Labels use the matched route template, never the raw path
//! - Without an installed recorder every call is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "openapi_router_requests_total";
pub const VALIDATION_FAILURES_TOTAL: &str = "openapi_router_validation_failures_total";
pub const HANDLER_DURATION_SECONDS: &str = "openapi_router_handler_duration_seconds";

/// Install the Prometheus recorder with its own scrape listener on `addr`.
pub fn install_prometheus(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, route: &str, status: StatusCode, started: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.as_u16().to_string()),
    ];
    counter!(REQUESTS_TOTAL, &labels[..]).increment(1);
    histogram!(HANDLER_DURATION_SECONDS, &labels[..2]).record(started.elapsed().as_secs_f64());
}

pub fn record_validation_failure(part: &'static str) {
    counter!(VALIDATION_FAILURES_TOTAL, "part" => part).increment(1);
}
