//! Telemetry configuration for the model server.
//!
//! This module defines logging output and OpenTelemetry export settings.

use serde::Deserialize;

/// Telemetry configuration settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Service name reported to exporters.
    pub service_name: String,
    /// OTLP endpoint for traces.
    pub otlp_endpoint: Option<String>,
    /// Sampling ratio for traces.
    pub sampling_ratio: f64,
    /// Emit logs as JSON lines instead of plain text.
    pub json: bool,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service_name: crate::SERVICE_NAME.to_string(),
            otlp_endpoint: None,
            sampling_ratio: 1.0,
            json: true,
        }
    }
}
