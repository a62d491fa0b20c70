use crate::settings::{LogLevel, TelemetrySettings};
use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::Sampler, Resource};
use opentelemetry_semantic_conventions::resource;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Builder for setting up telemetry (logging and tracing).
pub struct TelemetryBuilder {
    service_name: String,
    service_version: String,
    otlp_endpoint: Option<String>,
    log_level: LogLevel,
    sampling_ratio: f64,
    json: bool,
}

impl TelemetryBuilder {
    /// Creates a builder logging at `INFO` as JSON, without trace export.
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            otlp_endpoint: None,
            log_level: LogLevel::Info,
            sampling_ratio: 1.0,
            json: true,
        }
    }

    /// Creates a builder from loaded telemetry settings.
    pub fn from_settings(settings: &TelemetrySettings) -> Self {
        let builder = Self::new(settings.service_name.clone(), crate::SERVICE_VERSION)
            .with_sampling_ratio(settings.sampling_ratio)
            .with_json(settings.json);
        match settings.otlp_endpoint {
            Some(ref endpoint) => builder.with_tracing(endpoint),
            None => builder,
        }
    }

    /// Exports spans to an OTLP collector at `endpoint`.
    #[must_use]
    pub fn with_tracing(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the default filter level; `RUST_LOG` still wins.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Sets the trace sampling ratio.
    #[must_use]
    pub fn with_sampling_ratio(mut self, ratio: f64) -> Self {
        self.sampling_ratio = ratio;
        self
    }

    /// Chooses JSON or plain text log lines.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Initializes the global subscriber with configured exporters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The OTLP span exporter cannot be built
    /// - A global subscriber is already installed
    pub fn init(self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.as_filter()));

        let fmt_layer = if self.json {
            fmt::layer().json().with_span_events(FmtSpan::CLOSE).boxed()
        } else {
            fmt::layer().with_span_events(FmtSpan::CLOSE).boxed()
        };

        let registry = Registry::default().with(env_filter).with(fmt_layer);

        let Some(endpoint) = self.otlp_endpoint else {
            return registry.try_init().context("Failed to init subscriber");
        };

        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

        let resource = Resource::builder()
            .with_attributes(vec![
                opentelemetry::KeyValue::new(resource::SERVICE_NAME, self.service_name.clone()),
                opentelemetry::KeyValue::new(resource::SERVICE_VERSION, self.service_version),
            ])
            .build();

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .context("Failed to build OTLP span exporter")?;

        let processor = opentelemetry_sdk::trace::BatchSpanProcessor::builder(exporter).build();

        let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_span_processor(processor)
            .with_resource(resource)
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
                self.sampling_ratio,
            ))))
            .build();

        opentelemetry::global::set_tracer_provider(provider.clone());

        let tracer = provider.tracer(self.service_name);
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        registry
            .with(telemetry_layer)
            .try_init()
            .context("Failed to init subscriber")
    }
}

/// Installs a plain subscriber at `level` unless one is already installed.
///
/// Returns `true` if this call installed it.
pub fn install_default(level: LogLevel) -> bool {
    TelemetryBuilder::new(crate::SERVICE_NAME, crate::SERVICE_VERSION)
        .with_log_level(level)
        .init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_copies_fields() {
        let settings = TelemetrySettings {
            service_name: "edge-server".to_string(),
            otlp_endpoint: Some("http://collector:4317".to_string()),
            sampling_ratio: 0.25,
            json: false,
        };
        let builder = TelemetryBuilder::from_settings(&settings);
        assert_eq!(builder.service_name, "edge-server");
        assert_eq!(builder.service_version, crate::SERVICE_VERSION);
        assert_eq!(builder.otlp_endpoint.as_deref(), Some("http://collector:4317"));
        assert!((builder.sampling_ratio - 0.25).abs() < f64::EPSILON);
        assert!(!builder.json);
        assert_eq!(builder.log_level, LogLevel::Info);
    }

    #[test]
    fn test_install_default_only_installs_once() {
        install_default(LogLevel::Debug);
        assert!(!install_default(LogLevel::Error));
    }
}
