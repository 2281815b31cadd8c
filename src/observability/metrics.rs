//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_dispatch_total` (counter): outbound calls by class, channel
//! - `proxy_dispatch_cancelled_total` (counter): limiter waits abandoned, by class
//! - `proxy_upstream_errors_total` (counter): transport failures, by class
//! - `proxy_limiter_wait_seconds` (histogram): time spent waiting for a token, by class
//! - `proxy_short_circuit_total` (counter): health/probe answers, by kind
//! - `proxy_pool_channels` (gauge): configured outbound channels
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::routing::RouteClass;

/// Install the Prometheus recorder and its scrape listener.
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(class: RouteClass, channel: usize) {
    counter!(
        "proxy_dispatch_total",
        "class" => class.as_str(),
        "channel" => channel.to_string()
    )
    .increment(1);
}

pub fn record_cancelled(class: RouteClass) {
    counter!("proxy_dispatch_cancelled_total", "class" => class.as_str()).increment(1);
}

pub fn record_upstream_error(class: RouteClass) {
    counter!("proxy_upstream_errors_total", "class" => class.as_str()).increment(1);
}

pub fn record_limiter_wait(class: RouteClass, waited: Duration) {
    histogram!("proxy_limiter_wait_seconds", "class" => class.as_str())
        .record(waited.as_secs_f64());
}

pub fn record_short_circuit(kind: &'static str) {
    counter!("proxy_short_circuit_total", "kind" => kind).increment(1);
}

pub fn record_pool_size(channels: usize) {
    gauge!("proxy_pool_channels").set(channels as f64);
}
