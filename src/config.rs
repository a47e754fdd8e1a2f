//! Configuration module for pingbar.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Initial monitor settings (target, thresholds, autostart)
//! - Probe back-end (icmp, command, tcp) and timeout
//! - Named target shortcuts
//! - Logging filter and format

mod app;
mod validation;

pub use app::{
    AppConfig, KnownTarget, LogFormat, LoggingConfig, MonitorConfig, ProbeConfig, ProbeMethod,
    default_known_targets,
};
pub use validation::{ConfigError, expand_env_vars, parse_duration};

// Re-export constants
pub use app::{DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
