//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guardian_recoveries_total` (counter): recoveries by outcome
//! - `guardian_gas_attempts_total` (counter): inner-loop attempts by verdict
//! - `guardian_outer_retries_total` (counter): outer-loop restarts
//! - `guardian_record_sync_failures_total` (counter): confirmed recoveries whose record write failed
//! - `guardian_rpc_health` (gauge): 1=healthy, 0=unhealthy

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_recovery(outcome: &'static str) {
    counter!("guardian_recoveries_total", "outcome" => outcome).increment(1);
}

pub fn record_gas_attempt(verdict: &'static str) {
    counter!("guardian_gas_attempts_total", "verdict" => verdict).increment(1);
}

pub fn record_outer_retry() {
    counter!("guardian_outer_retries_total").increment(1);
}

pub fn record_sync_failure() {
    counter!("guardian_record_sync_failures_total").increment(1);
}

pub fn record_rpc_health(healthy: bool) {
    gauge!("guardian_rpc_health").set(if healthy { 1.0 } else { 0.0 });
}
