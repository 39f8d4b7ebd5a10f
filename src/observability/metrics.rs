//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_sessions_total` (counter): sessions accepted, by backend
//! - `balancer_active_sessions` (gauge): currently relaying, by backend
//! - `balancer_relayed_bytes_total` (counter): bytes moved, by direction
//! - `balancer_backend_health` (gauge): 1=reachable, 0=unreachable

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
///
/// Failure to install is logged and otherwise ignored; recording macros
/// are no-ops without a recorder.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!(
                "balancer_sessions_total",
                "Total proxied sessions per backend"
            );
            describe_gauge!(
                "balancer_active_sessions",
                "Sessions currently relaying per backend"
            );
            describe_counter!(
                "balancer_relayed_bytes_total",
                "Bytes relayed per direction"
            );
            describe_gauge!(
                "balancer_backend_health",
                "Backend reachability (1 healthy, 0 unhealthy)"
            );
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

/// Record the start of a relaying session.
pub fn record_session_opened(backend: &str) {
    counter!("balancer_sessions_total", "backend" => backend.to_string()).increment(1);
    gauge!("balancer_active_sessions", "backend" => backend.to_string()).increment(1.0);
}

/// Record the end of a relaying session and the bytes it moved.
pub fn record_session_closed(backend: &str, outcome: crate::net::relay::RelayOutcome) {
    gauge!("balancer_active_sessions", "backend" => backend.to_string()).decrement(1.0);
    counter!("balancer_relayed_bytes_total", "direction" => "to_backend")
        .increment(outcome.to_backend);
    counter!("balancer_relayed_bytes_total", "direction" => "from_backend")
        .increment(outcome.from_backend);
}

/// Record a probe result for a backend.
pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("balancer_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
