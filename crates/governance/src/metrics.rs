//! Metrics implementation using Prometheus.

use metrics_exporter_prometheus::PrometheusBuilder;
use llm_governor_core::{BackendKind, Error, InteractionStatus, Result};

pub use metrics_exporter_prometheus::PrometheusHandle;

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Count a governance decision and record its latency.
pub fn track_decision(status: InteractionStatus, backend: BackendKind, latency_sec: f64) {
    metrics::counter!(
        "governance_interactions_total",
        "status" => status.as_str(),
        "backend" => backend.as_str()
    )
    .increment(1);

    metrics::histogram!(
        "governance_decision_duration_seconds",
        "backend" => backend.as_str()
    )
    .record(latency_sec);
}

/// Count a fallback from the remote backend to the local rule engine.
pub fn track_fallback(kind: &str) {
    metrics::counter!("governance_remote_fallback_total", "kind" => kind.to_string()).increment(1);
}

/// Count a failed store write.
pub fn track_persistence_failure(operation: &'static str) {
    metrics::counter!("governance_persistence_failures_total", "operation" => operation).increment(1);
}

/// Count a probe result.
pub fn track_probe(available: bool) {
    metrics::counter!(
        "governance_probe_total",
        "available" => if available { "true" } else { "false" }
    )
    .increment(1);
}
