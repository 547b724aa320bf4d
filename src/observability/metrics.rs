//! Metrics collection and exposition.
//!
//! # Metrics
//! - `control_config_reads_total` (counter): reads by outcome
//! - `control_config_saves_total` (counter): saves by outcome
//! - `control_backups_total` (counter): created / skipped / failed
//! - `control_restart_requests_total` (counter): acknowledged restarts
//! - `control_restart_spawns_total` (counter): spawned / spawn_failed

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

pub fn record_config_read(ok: bool) {
    ::metrics::counter!("control_config_reads_total", "outcome" => outcome(ok)).increment(1);
}

pub fn record_config_save(ok: bool) {
    ::metrics::counter!("control_config_saves_total", "outcome" => outcome(ok)).increment(1);
}

pub fn record_backup(result: &'static str) {
    ::metrics::counter!("control_backups_total", "result" => result).increment(1);
}

pub fn record_restart_request() {
    ::metrics::counter!("control_restart_requests_total").increment(1);
}

pub fn record_restart_spawn(result: &'static str) {
    ::metrics::counter!("control_restart_spawns_total", "result" => result).increment(1);
}
