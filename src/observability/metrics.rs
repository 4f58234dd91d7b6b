//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_sim_decisions_total` (counter): routing decisions by policy, outcome
//! - `lb_sim_completions_total` (counter): requests that finished service
//! - `lb_sim_swept_requests_total` (counter): requests reclaimed by the sweep
//! - `lb_sim_server_load` (gauge): in-flight requests per server
//! - `lb_sim_server_available` (gauge): 1=available, 0=unavailable

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::load_balancer::server::ServerId;
use crate::load_balancer::{Policy, RoutingOutcome};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(policy: Policy, outcome: &RoutingOutcome) {
    let outcome = match outcome {
        RoutingOutcome::Routed(_) => "routed",
        RoutingOutcome::NoCapacity => "no_capacity",
    };
    metrics::counter!("lb_sim_decisions_total", "policy" => policy.as_str(), "outcome" => outcome)
        .increment(1);
}

pub fn record_completion() {
    metrics::counter!("lb_sim_completions_total").increment(1);
}

pub fn record_swept(count: usize) {
    metrics::counter!("lb_sim_swept_requests_total").increment(count as u64);
}

pub fn record_server_load(server: ServerId, load: u32) {
    metrics::gauge!("lb_sim_server_load", "server" => server.to_string()).set(load as f64);
}

pub fn record_server_available(server: ServerId, available: bool) {
    metrics::gauge!("lb_sim_server_available", "server" => server.to_string())
        .set(if available { 1.0 } else { 0.0 });
}
