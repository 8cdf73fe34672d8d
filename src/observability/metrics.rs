//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ingress_startup_stage` (gauge): ordinal of the current startup stage
//! - `ingress_overlay_peers` (gauge): known overlay peers
//! - `ingress_ingestion_errors_total` (counter): by pipeline
//! - `ingress_submissions_total` (counter): by kind, status
//! - `ingress_darknodes` (gauge): registered darknodes at last sync

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::ingress::Pipeline;
use crate::lifecycle::Stage;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_stage(stage: Stage) {
    metrics::gauge!("ingress_startup_stage").set(stage.ordinal() as f64);
}

pub fn record_peer_count(peers: usize) {
    metrics::gauge!("ingress_overlay_peers").set(peers as f64);
}

pub fn record_darknode_count(darknodes: usize) {
    metrics::gauge!("ingress_darknodes").set(darknodes as f64);
}

pub fn record_ingestion_error(pipeline: Pipeline) {
    metrics::counter!("ingress_ingestion_errors_total", "pipeline" => pipeline.as_str()).increment(1);
}

pub fn record_submission(kind: &'static str, status: u16) {
    metrics::counter!(
        "ingress_submissions_total",
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
}
