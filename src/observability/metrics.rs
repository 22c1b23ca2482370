//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_phase_duration_seconds` (histogram): time spent fanning out one phase
//! - `lifecycle_participant_failures_total` (counter): failed participants by phase
//! - `lifecycle_gate_fired_total` (counter): gate firings by gate

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::gate::GateKind;
use crate::lifecycle::phase::Phase;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_phase_duration(phase: Phase, elapsed: Duration) {
    ::metrics::histogram!("lifecycle_phase_duration_seconds", "phase" => phase.as_str())
        .record(elapsed.as_secs_f64());
}

pub fn record_participant_failure(phase: Phase) {
    ::metrics::counter!("lifecycle_participant_failures_total", "phase" => phase.as_str())
        .increment(1);
}

pub fn record_gate_fired(gate: GateKind) {
    ::metrics::counter!("lifecycle_gate_fired_total", "gate" => gate.as_str()).increment(1);
}
