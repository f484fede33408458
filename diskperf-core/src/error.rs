//! Error types for statistics sources and the monitor loop.

use std::io;

use thiserror::Error;

/// Errors a device statistics source can report for one read.
///
/// Apart from [`StatsError::Unsupported`], every variant means "no sample
/// this tick": the monitor skips the tick and tries again on the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The device identity does not resolve on this system.
    #[error("Device not found: {0}")]
    NotFound(String),

    /// Extended I/O statistics are not exposed by this system.
    #[error("Extended I/O statistics not available: {0}")]
    Unsupported(String),

    /// Any other OS-level failure, with the raw error code.
    #[error("OS error {0}")]
    Os(i32),

    /// I/O failure without an OS error code.
    #[error("I/O error: {0}")]
    Io(String),

    /// The statistics could not be decoded.
    #[error("Failed to parse statistics: {0}")]
    Parse(String),

    /// The feed behind the source has gone away.
    #[error("Statistics feed disconnected")]
    Disconnected,
}

impl StatsError {
    /// Whether the next tick may succeed where this one failed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, StatsError::Unsupported(_))
    }
}

impl From<io::Error> for StatsError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            StatsError::NotFound(err.to_string())
        } else if let Some(code) = err.raw_os_error() {
            StatsError::Os(code)
        } else {
            StatsError::Io(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(err: serde_json::Error) -> Self {
        StatsError::Parse(err.to_string())
    }
}

/// Errors that end a monitor loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The startup probe found no usable statistics.
    #[error("This monitor will not work, please remove it: {0}")]
    Unsupported(#[source] StatsError),

    /// The background task panicked or was cancelled.
    #[error("Monitor task failed: {0}")]
    Task(String),
}
