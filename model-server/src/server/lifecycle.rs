//! Start/liveness state machine.
//!
//! ```text
//! NotStarted --begin_start--> Starting --mark_live--> Live
//!     ^                          \--mark_failed--> Failed
//!     |                                              |
//!     +-- finish_stop -- Stopping <-- begin_stop (Live|Failed)
//! ```
//!
//! `Failed` may begin a new start. Starting and stopping are both claimed
//! transitions: while one is owned, the other is rejected. All transitions
//! are single atomic operations so readers never block.

use crate::error::ServerError;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a server handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ServerState {
    /// No start attempted, or stopped.
    NotStarted = 0,
    /// A start is in flight.
    Starting = 1,
    /// Transports are serving.
    Live = 2,
    /// The last start failed, or a transport stopped unexpectedly.
    Failed = 3,
    /// A shutdown is in flight.
    Stopping = 4,
}

impl ServerState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Live,
            3 => Self::Failed,
            4 => Self::Stopping,
            _ => Self::NotStarted,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Starting => "STARTING",
            Self::Live => "LIVE",
            Self::Failed => "FAILED",
            Self::Stopping => "STOPPING",
        })
    }
}

/// Shared, lock-free holder of a [`ServerState`].
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Creates a lifecycle in [`ServerState::NotStarted`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ServerState::NotStarted as u8),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn current(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns `true` only in [`ServerState::Live`].
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.current() == ServerState::Live
    }

    /// Claims the start transition from `NotStarted` or `Failed`.
    ///
    /// # Errors
    ///
    /// [`ServerError::AlreadyLive`], [`ServerError::StartInProgress`] or
    /// [`ServerError::StopInProgress`] when another caller owns the server.
    pub fn begin_start(&self) -> Result<ServerState, ServerError> {
        self.claim(ServerState::Starting, |state| match state {
            ServerState::Live => Err(ServerError::AlreadyLive),
            ServerState::Starting => Err(ServerError::StartInProgress),
            ServerState::Stopping => Err(ServerError::StopInProgress),
            ServerState::NotStarted | ServerState::Failed => Ok(()),
        })
    }

    /// Claims the stop transition from `Live` or `Failed`.
    ///
    /// # Errors
    ///
    /// [`ServerError::NotStarted`] when there is nothing to stop,
    /// [`ServerError::StartInProgress`] or [`ServerError::StopInProgress`]
    /// when another caller owns the server.
    pub fn begin_stop(&self) -> Result<ServerState, ServerError> {
        self.claim(ServerState::Stopping, |state| match state {
            ServerState::NotStarted => Err(ServerError::NotStarted),
            ServerState::Starting => Err(ServerError::StartInProgress),
            ServerState::Stopping => Err(ServerError::StopInProgress),
            ServerState::Live | ServerState::Failed => Ok(()),
        })
    }

    /// `Stopping -> NotStarted`, once the transports are gone.
    pub fn finish_stop(&self) -> bool {
        self.transition(ServerState::Stopping, ServerState::NotStarted)
    }

    /// `Starting -> Live`.
    ///
    /// Returns `false` if the state moved away from `Starting` meanwhile.
    pub fn mark_live(&self) -> bool {
        self.transition(ServerState::Starting, ServerState::Live)
    }

    /// Moves `Starting` or `Live` to `Failed`.
    ///
    /// Returns `true` if the state changed.
    pub fn mark_failed(&self) -> bool {
        self.transition(ServerState::Starting, ServerState::Failed)
            || self.transition(ServerState::Live, ServerState::Failed)
    }

    /// Moves to `target` if `allowed` accepts the current state, retrying
    /// when the state changes underneath.
    fn claim(
        &self,
        target: ServerState,
        allowed: impl Fn(ServerState) -> Result<(), ServerError>,
    ) -> Result<ServerState, ServerError> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let previous = ServerState::from_u8(current);
            allowed(previous)?;
            match self.state.compare_exchange(
                current,
                target as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(previous),
                Err(actual) => current = actual,
            }
        }
    }

    fn transition(&self, from: ServerState, to: ServerState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
