//! Commands accepted from the presentation layer.

use strum_macros::AsRefStr;

use crate::monitor::thresholds::ThresholdSpec;

/// A user-driven change to the monitor.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    /// Probe a different host from the next tick on.
    SetTarget(String),
    /// Switch to a preset or custom threshold pair.
    SetThresholds(ThresholdSpec),
    /// Record the launch-at-login preference.
    SetAutostart(bool),
    /// Start (or restart) the probe loop.
    Start,
    /// Stop the probe loop, keeping the last status.
    Stop,
}
