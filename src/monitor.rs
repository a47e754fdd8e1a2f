//! Monitor Layer
//!
//! The measurement-and-state loop. A [`Scheduler`] ticks every
//! [`TICK_PERIOD`], reads a [`Settings`] snapshot from the
//! [`SettingsStore`], runs one probe, maps it through [`classify`] and
//! overwrites the single [`Status`] held by the [`StatusPublisher`].
//!
//! # Architecture
//!
//! - [`SettingsStore`]: copy-on-write settings, written by the UI, read per tick
//! - [`StatusPublisher`]: single-slot status, written per tick, read by the UI
//! - [`Scheduler`]: timer loop with skip-if-busy ticks and prompt stop
//! - [`Monitor`]: the three wired together, plus [`Command`] handling

mod command;
mod error;
mod handle;
mod scheduler;
mod settings;
mod status;
mod thresholds;

pub use command::Command;
pub use error::MonitorError;
pub use handle::{AutostartHook, Monitor, NoopAutostart};
pub use scheduler::{
    DEFAULT_PROBE_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT, MAX_PROBE_TIMEOUT, PROBE_SLACK, Scheduler,
    SchedulerState, TICK_PERIOD,
};
pub use settings::{DEFAULT_TARGET, Settings, SettingsStore};
pub use status::{Status, StatusPublisher, StatusWatch};
pub use thresholds::{
    Severity, ThresholdError, ThresholdPair, ThresholdPreset, ThresholdSpec, classify,
};
