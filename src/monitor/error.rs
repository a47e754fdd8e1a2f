//! Monitor error types.
//!
//! Only configuration and lifecycle mistakes surface here. Probe failures
//! never become errors; they are published as `Error` severity instead.

use thiserror::Error;

use crate::monitor::thresholds::ThresholdError;
use crate::probe::TargetError;

/// Errors returned synchronously to the caller of a monitor operation.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Rejected target; the previous target is kept.
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    /// Rejected thresholds; the previous pair is kept.
    #[error(transparent)]
    InvalidThresholds(#[from] ThresholdError),

    /// `start` while the probe loop is already running.
    #[error("monitor is already running")]
    AlreadyRunning,

    /// `start` called outside a tokio runtime.
    #[error("no async runtime available: {0}")]
    Runtime(String),

    /// The autostart collaborator failed; the flag is unchanged.
    #[error("autostart registration failed: {0}")]
    Autostart(#[from] std::io::Error),
}
