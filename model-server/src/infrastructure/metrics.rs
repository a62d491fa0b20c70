//! Prometheus exporter shared by every server started in the process.
//!
//! The `metrics` facade allows one global recorder, so the exporter is
//! installed on first use and its handle reused across restarts.

use crate::error::ServerError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::{const_mutex, Mutex};

/// Counter of `start` calls, labelled by `outcome`.
pub const START_ATTEMPTS: &str = "model_server_start_attempts_total";
/// Counter of served health/metadata requests, labelled by `transport` and `endpoint`.
pub const REQUESTS: &str = "model_server_requests_total";
/// Gauge that is `1` while the server is live.
pub const LIVE: &str = "model_server_live";

static PROMETHEUS: Mutex<Option<PrometheusHandle>> = const_mutex(None);

/// Returns the process-wide Prometheus handle, installing the recorder if needed.
///
/// # Errors
///
/// [`ServerError::MetricsInit`] if another recorder is already installed.
pub fn prometheus_handle() -> Result<PrometheusHandle, ServerError> {
    let mut slot = PROMETHEUS.lock();
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::MetricsInit(e.to_string()))?;
    *slot = Some(handle.clone());
    Ok(handle)
}

/// Records one request on `transport` for `endpoint`.
pub fn record_request(transport: &'static str, endpoint: &'static str) {
    metrics::counter!(REQUESTS, "transport" => transport, "endpoint" => endpoint).increment(1);
}

/// Records the outcome of a `start` call.
pub fn record_start(outcome: &'static str) {
    metrics::counter!(START_ATTEMPTS, "outcome" => outcome).increment(1);
}

/// Publishes liveness.
pub fn set_live(live: bool) {
    metrics::gauge!(LIVE).set(if live { 1.0 } else { 0.0 });
}
