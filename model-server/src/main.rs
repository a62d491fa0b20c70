//! `model-server` binary: starts the server from file and environment
//! settings and runs until interrupted.

use anyhow::{anyhow, Context};
use model_server::infrastructure::telemetry::TelemetryBuilder;
use model_server::settings::{LogLevel, Settings};
use model_server::ServerHandle;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Settings::new().context("Failed to load configuration")?;

    // An unparseable level is reported by `start`; log at INFO until then.
    let log_level = config
        .server
        .log_level()
        .parse::<LogLevel>()
        .unwrap_or(LogLevel::Info);
    TelemetryBuilder::from_settings(&config.telemetry)
        .with_log_level(log_level)
        .init()
        .context("Failed to initialize telemetry")?;

    info!("Model Server Starting...");

    let server = ServerHandle::new();
    let status = tokio::task::block_in_place(|| server.start(&config.server, &config.models));
    if !status.is_ok() {
        error!(code = %status.code(), "Model Server failed to start: {status}");
        return Err(anyhow!("server start failed: {status}"));
    }

    info!("Model Server Live. Waiting for shutdown signal...");

    shutdown_signal().await;

    info!("Shutdown signal received, cleaning up...");
    let status = tokio::task::block_in_place(|| server.shutdown());
    if !status.is_ok() {
        error!(code = %status.code(), "Shutdown reported {status}");
    }

    info!("Model Server Shutdown Complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
