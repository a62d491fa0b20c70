//! Error types for server startup and shutdown.
//!
//! Failures are modelled as [`ServerError`] inside the crate and cross the
//! control surface only as a [`Status`].

use crate::status::{Status, StatusCode};
use std::io;
use std::path::PathBuf;

/// Errors that can occur while starting or stopping the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Server is already live
    #[error("Server is already live")]
    AlreadyLive,
    /// Another start owns the transition
    #[error("Server start already in progress")]
    StartInProgress,
    /// Nothing is running
    #[error("Server is not started")]
    NotStarted,
    /// Another stop owns the transition
    #[error("Server stop already in progress")]
    StopInProgress,
    /// gRPC port rejected
    #[error("Invalid gRPC port: {0}")]
    InvalidGrpcPort(u16),
    /// Both transports configured onto one socket
    #[error("gRPC and REST cannot share {address}:{port}")]
    PortConflict {
        /// Shared bind address.
        address: String,
        /// Shared port.
        port: u16,
    },
    /// Bind address is not an IP address
    #[error("Invalid bind address '{0}'")]
    InvalidBindAddress(String),
    /// Worker hint out of range
    #[error("Invalid gRPC worker count {0}, expected 1..={max}", max = crate::settings::MAX_GRPC_WORKERS)]
    InvalidWorkerCount(u32),
    /// Unrecognized log level name
    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),
    /// Metrics enabled with the REST transport disabled
    #[error("Metrics require the REST transport to be enabled")]
    MetricsRequireRest,
    /// Descriptor file not present
    #[error("Model repository config not found: {}", .0.display())]
    ConfigFileMissing(PathBuf),
    /// Descriptor could not be read or parsed
    #[error("Model repository config {} is invalid: {reason}", .path.display())]
    ConfigFileInvalid {
        /// Descriptor path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
    /// Descriptor parsed but a model entry is unusable
    #[error("Invalid model config: {0}")]
    ModelConfigInvalid(String),
    /// Listener address taken
    #[error("Address {0} is already in use")]
    PortInUse(String),
    /// Listener could not be bound
    #[error("Failed to bind {address}: {source}")]
    BindFailed {
        /// Requested socket address.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Async runtime or serving thread failure
    #[error("Serving runtime error: {0}")]
    Runtime(String),
    /// Prometheus recorder installation failure
    #[error("Failed to install Prometheus recorder: {0}")]
    MetricsInit(String),
}

impl ServerError {
    /// The status code this error is reported as.
    #[must_use]
    pub fn code(&self) -> StatusCode {
        match self {
            Self::AlreadyLive => StatusCode::AlreadyLive,
            Self::StartInProgress => StatusCode::StartInProgress,
            Self::NotStarted => StatusCode::NotStarted,
            Self::StopInProgress => StatusCode::StopInProgress,
            Self::InvalidGrpcPort(_) => StatusCode::InvalidGrpcPort,
            Self::PortConflict { .. } => StatusCode::PortConflict,
            Self::InvalidBindAddress(_) => StatusCode::InvalidBindAddress,
            Self::InvalidWorkerCount(_) => StatusCode::InvalidWorkerCount,
            Self::InvalidLogLevel(_) => StatusCode::InvalidLogLevel,
            Self::MetricsRequireRest => StatusCode::MetricsRequireRest,
            Self::ConfigFileMissing(_) => StatusCode::ConfigFileMissing,
            Self::ConfigFileInvalid { .. } => StatusCode::ConfigFileInvalid,
            Self::ModelConfigInvalid(_) => StatusCode::ModelConfigInvalid,
            Self::PortInUse(_) => StatusCode::PortInUse,
            Self::BindFailed { .. } => StatusCode::BindFailed,
            Self::Runtime(_) => StatusCode::RuntimeFailed,
            Self::MetricsInit(_) => StatusCode::MetricsInitFailed,
        }
    }

    /// Classifies a listener bind failure.
    pub(crate) fn bind(address: impl Into<String>, source: io::Error) -> Self {
        let address = address.into();
        if source.kind() == io::ErrorKind::AddrInUse {
            Self::PortInUse(address)
        } else {
            Self::BindFailed { address, source }
        }
    }
}

impl From<ServerError> for Status {
    fn from(err: ServerError) -> Self {
        Self::new(err.code()).with_message(err.to_string())
    }
}
