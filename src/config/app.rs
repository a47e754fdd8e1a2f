//! Application configuration structures.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::monitor::{
    DEFAULT_PROBE_TIMEOUT, DEFAULT_TARGET, MAX_PROBE_TIMEOUT, Settings, ThresholdSpec,
};
use crate::probe::{CommandProber, IcmpProber, Prober, Target, TcpProber};

use super::validation::{ConfigError, expand_env_vars};

/// Default config file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "pingbar.yaml";

/// Default log filter.
pub const DEFAULT_LOG_FILTER: &str = "info";

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_probe_timeout() -> Duration {
    DEFAULT_PROBE_TIMEOUT
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

// =============================================================================
// Monitor Configuration
// =============================================================================

/// Initial monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Host or known target name to probe; `${VAR:-default}` references
    /// are expanded.
    #[serde(default = "default_target")]
    pub target: String,

    /// Preset name or `{good_max, warn_max}` (default: normal).
    pub thresholds: ThresholdSpec,

    /// Launch at login (default: false).
    pub autostart: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            thresholds: ThresholdSpec::default(),
            autostart: false,
        }
    }
}

// =============================================================================
// Probe Configuration
// =============================================================================

/// Probe back-end.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProbeMethod {
    /// ICMP echo via `surge-ping`.
    #[default]
    Icmp,
    /// The system `ping` binary.
    Command,
    /// TCP connect to `port`.
    Tcp,
}

impl TryFrom<String> for ProbeMethod {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.trim()
            .parse()
            .map_err(|_| format!("unknown probe method '{name}' (icmp, command, tcp)"))
    }
}

/// Probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Back-end (default: icmp).
    pub method: ProbeMethod,

    /// Destination port, required for `tcp`.
    pub port: Option<u16>,

    /// Per-probe timeout (default and maximum: 1750ms).
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            method: ProbeMethod::default(),
            port: None,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ProbeConfig {
    /// Build the configured prober.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` for `tcp` without a port.
    pub fn build(&self) -> Result<Arc<dyn Prober>, ConfigError> {
        let prober: Arc<dyn Prober> = match self.method {
            ProbeMethod::Icmp => Arc::new(IcmpProber::new()),
            ProbeMethod::Command => Arc::new(CommandProber::new()),
            ProbeMethod::Tcp => {
                let port = self.port.ok_or_else(|| {
                    ConfigError::ValidationError("probe method 'tcp' requires a port".to_string())
                })?;
                Arc::new(TcpProber::new(port))
            }
        };
        Ok(prober)
    }
}

// =============================================================================
// Known Targets
// =============================================================================

/// A named shortcut for a commonly probed host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownTarget {
    /// Short name used on the command line (e.g. `cloudflare`).
    pub name: String,
    /// Display label.
    pub label: String,
    /// Host to probe.
    pub host: String,
}

impl KnownTarget {
    fn new(name: &str, label: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            host: host.to_string(),
        }
    }
}

/// Well-known public resolvers plus loopback.
pub fn default_known_targets() -> Vec<KnownTarget> {
    vec![
        KnownTarget::new("google", "Google DNS", "8.8.8.8"),
        KnownTarget::new("cloudflare", "Cloudflare", "1.1.1.1"),
        KnownTarget::new("quad9", "Quad9", "9.9.9.9"),
        KnownTarget::new("opendns", "OpenDNS", "208.67.222.222"),
        KnownTarget::new("localhost", "localhost", "127.0.0.1"),
    ]
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Log output format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl TryFrom<String> for LogFormat {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.trim()
            .parse()
            .map_err(|_| format!("unknown log format '{name}' (text, json)"))
    }
}

/// Logging settings. `RUST_LOG` overrides `filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Output format (default: text).
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial monitor settings.
    pub monitor: MonitorConfig,

    /// Probe back-end settings.
    pub probe: ProbeConfig,

    /// Named target shortcuts.
    #[serde(default = "default_known_targets")]
    pub targets: Vec<KnownTarget>,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            probe: ProbeConfig::default(),
            targets: default_known_targets(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file without validating it.
    ///
    /// Logs nothing, so it can run before the subscriber is installed;
    /// call [`AppConfig::validate`] afterwards.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse_yaml(&content)
    }

    /// Load `path`, falling back to defaults if it does not exist.
    ///
    /// # Errors
    /// Same as [`AppConfig::load`] for a file that exists.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse and validate YAML text.
    ///
    /// # Errors
    /// Returns `ConfigError` if the text cannot be parsed or validated.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_yaml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        let target = expand_env_vars(&config.monitor.target);
        config.monitor.target = config.resolve_target(&target).to_string();
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Target::parse(&self.monitor.target).map_err(|e| {
            ConfigError::ValidationError(format!("monitor target: {e}"))
        })?;

        self.monitor.thresholds.resolve().map_err(|e| {
            ConfigError::ValidationError(format!("monitor thresholds: {e}"))
        })?;

        if self.probe.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "probe timeout must be positive".to_string(),
            ));
        }
        if self.probe.timeout > MAX_PROBE_TIMEOUT {
            tracing::warn!(
                timeout = ?self.probe.timeout,
                max = ?MAX_PROBE_TIMEOUT,
                "Probe timeout leaves no room before the next tick and will be clamped"
            );
        }
        if self.probe.method == ProbeMethod::Tcp && self.probe.port.is_none() {
            return Err(ConfigError::ValidationError(
                "probe method 'tcp' requires a port".to_string(),
            ));
        }
        if self.probe.port == Some(0) {
            return Err(ConfigError::ValidationError(
                "probe port must be non-zero".to_string(),
            ));
        }

        let mut seen_names = HashSet::new();
        for known in &self.targets {
            if known.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "target name cannot be empty".to_string(),
                ));
            }
            if !seen_names.insert(known.name.to_ascii_lowercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate target name: '{}'",
                    known.name
                )));
            }
            Target::parse(&known.host).map_err(|e| {
                ConfigError::ValidationError(format!("target '{}': {}", known.name, e))
            })?;
        }

        Ok(())
    }

    /// Initial runtime settings.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` for an invalid target or pair.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let target = Target::parse(&self.monitor.target)
            .map_err(|e| ConfigError::ValidationError(format!("monitor target: {e}")))?;
        let thresholds = self
            .monitor
            .thresholds
            .resolve()
            .map_err(|e| ConfigError::ValidationError(format!("monitor thresholds: {e}")))?;
        Ok(Settings {
            target,
            thresholds,
            autostart: self.monitor.autostart,
        })
    }

    /// Map a known target name (case-insensitive) to its host; other input
    /// is returned unchanged.
    pub fn resolve_target<'a>(&'a self, input: &'a str) -> &'a str {
        let input = input.trim();
        self.targets
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(input))
            .map_or(input, |t| t.host.as_str())
    }
}
