//! Server transport and runtime settings.
//!
//! Values are inert until [`ServerSettings::resolve`] runs at start time;
//! construction and setters never validate.

use crate::error::ServerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Default bind address for both transports.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
/// Default gRPC port.
pub const DEFAULT_GRPC_PORT: u16 = 9178;
/// Default REST port; `0` keeps REST disabled.
pub const DEFAULT_REST_PORT: u16 = 0;
/// Default gRPC worker hint.
pub const DEFAULT_GRPC_WORKERS: u32 = 1;
/// Default log level name.
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
/// Largest accepted gRPC worker hint.
pub const MAX_GRPC_WORKERS: u32 = 256;

/// Server binding and runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    grpc_bind_address: String,
    grpc_port: u16,
    rest_port: u16,
    rest_bind_address: String,
    grpc_workers: u32,
    metrics_enabled: bool,
    log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            grpc_bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            grpc_port: DEFAULT_GRPC_PORT,
            rest_port: DEFAULT_REST_PORT,
            rest_bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            grpc_workers: DEFAULT_GRPC_WORKERS,
            metrics_enabled: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerSettings {
    /// Creates settings carrying the documented defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the gRPC transport binds to.
    #[must_use]
    pub fn grpc_bind_address(&self) -> &str {
        &self.grpc_bind_address
    }

    /// gRPC port.
    #[must_use]
    pub fn grpc_port(&self) -> u16 {
        self.grpc_port
    }

    /// REST port, `0` when REST is disabled.
    #[must_use]
    pub fn rest_port(&self) -> u16 {
        self.rest_port
    }

    /// Address the REST transport binds to.
    #[must_use]
    pub fn rest_bind_address(&self) -> &str {
        &self.rest_bind_address
    }

    /// Worker concurrency hint for the serving runtime.
    #[must_use]
    pub fn grpc_workers(&self) -> u32 {
        self.grpc_workers
    }

    /// Whether the Prometheus endpoint is served.
    #[must_use]
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    /// Log level name as configured.
    #[must_use]
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Sets the gRPC port in place.
    pub fn set_grpc_port(&mut self, port: u16) -> &mut Self {
        self.grpc_port = port;
        self
    }

    /// Sets the gRPC bind address.
    #[must_use]
    pub fn with_grpc_bind_address(mut self, address: impl Into<String>) -> Self {
        self.grpc_bind_address = address.into();
        self
    }

    /// Sets the gRPC port.
    #[must_use]
    pub fn with_grpc_port(mut self, port: u16) -> Self {
        self.grpc_port = port;
        self
    }

    /// Sets the REST port; `0` disables REST.
    #[must_use]
    pub fn with_rest_port(mut self, port: u16) -> Self {
        self.rest_port = port;
        self
    }

    /// Sets the REST bind address.
    #[must_use]
    pub fn with_rest_bind_address(mut self, address: impl Into<String>) -> Self {
        self.rest_bind_address = address.into();
        self
    }

    /// Sets the worker concurrency hint.
    #[must_use]
    pub fn with_grpc_workers(mut self, workers: u32) -> Self {
        self.grpc_workers = workers;
        self
    }

    /// Enables or disables the metrics endpoint.
    #[must_use]
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Sets the log level name.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validates the settings and resolves them into socket addresses.
    ///
    /// # Errors
    ///
    /// Returns the first rule the settings break, checked in the order
    /// port, addresses, port overlap, workers, log level, metrics.
    pub fn resolve(&self) -> Result<ResolvedServerSettings, ServerError> {
        if self.grpc_port == 0 {
            return Err(ServerError::InvalidGrpcPort(self.grpc_port));
        }
        let grpc_ip = parse_ip(&self.grpc_bind_address)?;

        let rest_addr = if self.rest_port == 0 {
            None
        } else {
            let rest_ip = parse_ip(&self.rest_bind_address)?;
            let overlapping =
                grpc_ip == rest_ip || grpc_ip.is_unspecified() || rest_ip.is_unspecified();
            if self.rest_port == self.grpc_port && overlapping {
                return Err(ServerError::PortConflict {
                    address: self.rest_bind_address.clone(),
                    port: self.rest_port,
                });
            }
            Some(SocketAddr::new(rest_ip, self.rest_port))
        };

        if !(1..=MAX_GRPC_WORKERS).contains(&self.grpc_workers) {
            return Err(ServerError::InvalidWorkerCount(self.grpc_workers));
        }
        let log_level = self.log_level.parse::<LogLevel>()?;

        if self.metrics_enabled && rest_addr.is_none() {
            return Err(ServerError::MetricsRequireRest);
        }

        Ok(ResolvedServerSettings {
            grpc_addr: SocketAddr::new(grpc_ip, self.grpc_port),
            rest_addr,
            workers: self.grpc_workers as usize,
            metrics_enabled: self.metrics_enabled,
            log_level,
        })
    }
}

fn parse_ip(address: &str) -> Result<IpAddr, ServerError> {
    address
        .trim()
        .parse()
        .map_err(|_| ServerError::InvalidBindAddress(address.to_string()))
}

/// Validated form of [`ServerSettings`] used to launch the transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServerSettings {
    /// gRPC listener address.
    pub grpc_addr: SocketAddr,
    /// REST listener address, when REST is enabled.
    pub rest_addr: Option<SocketAddr>,
    /// Worker threads for the serving runtime.
    pub workers: usize,
    /// Whether `/metrics` is served.
    pub metrics_enabled: bool,
    /// Parsed log level.
    pub log_level: LogLevel,
}

/// Log verbosity accepted in [`ServerSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Debug and above.
    Debug,
    /// Informational and above.
    Info,
    /// Warnings and errors.
    Warning,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// The `EnvFilter` directive for this level.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            _ => Err(ServerError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}
