//! Outcome codes reported across the control surface.
//!
//! Every operation that can fail reports through a [`Status`]. The set of
//! [`StatusCode`]s is versioned: each code keeps its number and symbolic
//! name forever, and new codes are only ever appended.

use serde::Serialize;
use std::fmt;

/// Result code carried by a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
#[repr(u32)]
pub enum StatusCode {
    /// The operation succeeded.
    Ok = 0,
    /// `start` was called on a server that is already live.
    AlreadyLive = 1,
    /// Another caller is currently starting the server.
    StartInProgress = 2,
    /// `shutdown` was called with nothing running.
    NotStarted = 3,
    /// Another caller is currently stopping the server.
    StopInProgress = 4,
    /// The gRPC port is not a usable port.
    InvalidGrpcPort = 10,
    /// The REST port is not a usable port.
    InvalidRestPort = 11,
    /// gRPC and REST were configured onto the same socket.
    PortConflict = 12,
    /// A bind address is not an IP address.
    InvalidBindAddress = 13,
    /// The gRPC worker hint is out of range.
    InvalidWorkerCount = 14,
    /// The log level is not one of the supported names.
    InvalidLogLevel = 15,
    /// Metrics were enabled without the REST transport.
    MetricsRequireRest = 16,
    /// The model repository descriptor does not exist.
    ConfigFileMissing = 20,
    /// The model repository descriptor could not be parsed.
    ConfigFileInvalid = 21,
    /// The model repository descriptor parsed but describes invalid models.
    ModelConfigInvalid = 22,
    /// A listener address is already bound by someone else.
    PortInUse = 30,
    /// A listener could not be bound for another reason.
    BindFailed = 31,
    /// The serving runtime could not be created or stopped unexpectedly.
    RuntimeFailed = 32,
    /// The Prometheus recorder could not be installed.
    MetricsInitFailed = 33,
}

impl StatusCode {
    const ALL: [Self; 19] = [
        Self::Ok,
        Self::AlreadyLive,
        Self::StartInProgress,
        Self::NotStarted,
        Self::StopInProgress,
        Self::InvalidGrpcPort,
        Self::InvalidRestPort,
        Self::PortConflict,
        Self::InvalidBindAddress,
        Self::InvalidWorkerCount,
        Self::InvalidLogLevel,
        Self::MetricsRequireRest,
        Self::ConfigFileMissing,
        Self::ConfigFileInvalid,
        Self::ModelConfigInvalid,
        Self::PortInUse,
        Self::BindFailed,
        Self::RuntimeFailed,
        Self::MetricsInitFailed,
    ];

    /// Stable numeric identity of the code.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Stable symbolic identity of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::AlreadyLive => "ALREADY_LIVE",
            Self::StartInProgress => "START_IN_PROGRESS",
            Self::NotStarted => "NOT_STARTED",
            Self::StopInProgress => "STOP_IN_PROGRESS",
            Self::InvalidGrpcPort => "INVALID_GRPC_PORT",
            Self::InvalidRestPort => "INVALID_REST_PORT",
            Self::PortConflict => "PORT_CONFLICT",
            Self::InvalidBindAddress => "INVALID_BIND_ADDRESS",
            Self::InvalidWorkerCount => "INVALID_WORKER_COUNT",
            Self::InvalidLogLevel => "INVALID_LOG_LEVEL",
            Self::MetricsRequireRest => "METRICS_REQUIRE_REST",
            Self::ConfigFileMissing => "CONFIG_FILE_MISSING",
            Self::ConfigFileInvalid => "CONFIG_FILE_INVALID",
            Self::ModelConfigInvalid => "MODEL_CONFIG_INVALID",
            Self::PortInUse => "PORT_IN_USE",
            Self::BindFailed => "BIND_FAILED",
            Self::RuntimeFailed => "RUNTIME_FAILED",
            Self::MetricsInitFailed => "METRICS_INIT_FAILED",
        }
    }

    /// Returns `true` for [`StatusCode::Ok`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a number does not name any known [`StatusCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown status code: {0}")]
pub struct UnknownStatusCode(pub u32);

impl TryFrom<u32> for StatusCode {
    type Error = UnknownStatusCode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_u32() == value)
            .ok_or(UnknownStatusCode(value))
    }
}

/// Outcome of a control-surface operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    message: Option<String>,
}

impl Status {
    /// A successful outcome.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: None,
        }
    }

    /// An outcome carrying `code` and no message.
    #[must_use]
    pub const fn new(code: StatusCode) -> Self {
        Self {
            code,
            message: None,
        }
    }

    /// Attaches a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The code this outcome carries.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns `true` when the code is [`StatusCode::Ok`].
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    /// Detail attached to a failure, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ok()
    }
}

impl From<StatusCode> for Status {
    fn from(code: StatusCode) -> Self {
        Self::new(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}
