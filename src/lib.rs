//! pingbar - Latency Monitor Library
//!
//! Periodically probes one host, classifies each round-trip time against a
//! pair of thresholds and publishes a single current status for a front end
//! to render as a colored badge.
//!
//! # Architecture
//!
//! - **Probe**: one reachability measurement per call (ICMP, system `ping`, TCP)
//! - **Monitor**: settings store, classifier, drift-free scheduler and status publisher
//! - **Config**: YAML configuration with environment overrides
//! - **Presentation**: badge rendering and console command parsing
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pingbar::{AppConfig, Monitor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load_or_default("pingbar.yaml")?;
//!     let monitor = Monitor::new(config.settings()?, config.probe.build()?)
//!         .with_probe_timeout(config.probe.timeout);
//!
//!     monitor.start()?;
//!     let mut watch = monitor.subscribe();
//!     while let Some(status) = watch.changed().await {
//!         println!("{}", status.describe());
//!     }
//!     Ok(())
//! }
//! ```

pub mod badge;
pub mod config;
pub mod console;
pub mod logging;
pub mod monitor;
pub mod probe;

pub use badge::{Badge, BadgeColor};
pub use config::{AppConfig, ConfigError};
pub use monitor::{
    AutostartHook, Command, Monitor, MonitorError, NoopAutostart, Scheduler, SchedulerState,
    Settings, SettingsStore, Severity, Status, StatusPublisher, StatusWatch, ThresholdError,
    ThresholdPair, ThresholdPreset, ThresholdSpec, classify,
};
pub use probe::{
    CommandProber, IcmpProber, ProbeFailure, ProbeOutcome, Prober, TcpProber, Target, TargetError,
};
