/// Lifecycle audit logging.
pub mod audit;
/// Prometheus recorder and metric names.
pub mod metrics;
/// Telemetry setup for logging and tracing.
pub mod telemetry;
