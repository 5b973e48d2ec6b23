//! Metrics collection and exposition.
//!
//! # Metrics
//! - `header_policy_responses_total` (counter): responses the policy was applied to, by route
//! - `header_policy_lifecycle_violations_total` (counter): applies attempted after headers were sent
//! - `header_policy_reloads_total` (counter): reload attempts, by outcome
//! - `header_policy_directives` (gauge): directive count of the active store
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op (tests, embedding)
//! - Prometheus exporter is optional and listens on its own address

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_applied(route: &str) {
    counter!("header_policy_responses_total", "route" => route.to_string()).increment(1);
}

pub fn record_lifecycle_violation() {
    counter!("header_policy_lifecycle_violations_total").increment(1);
}

/// `outcome` is `applied` or `rejected`.
pub fn record_reload(outcome: &'static str) {
    counter!("header_policy_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_directive_count(count: usize) {
    gauge!("header_policy_directives").set(count as f64);
}
