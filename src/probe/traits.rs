//! Core probe traits and types.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a DNS hostname.
const MAX_HOSTNAME_LEN: usize = 253;

/// Maximum length of a single hostname label.
const MAX_LABEL_LEN: usize = 63;

/// Errors raised when a target host string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// Blank input.
    #[error("target host cannot be empty")]
    Empty,

    /// Neither an IP address nor a syntactically valid hostname.
    #[error("malformed target host: '{0}'")]
    Malformed(String),
}

/// Host a probe is aimed at: an IP address or a hostname.
///
/// Always holds a validated, trimmed value. Replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Target(String);

impl Target {
    /// Validate and wrap a host string.
    ///
    /// # Errors
    /// Returns [`TargetError`] if the string is blank or not a valid host.
    pub fn parse(host: &str) -> Result<Self, TargetError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(TargetError::Empty);
        }
        if host.parse::<IpAddr>().is_ok() || is_valid_hostname(host) {
            Ok(Self(host.to_string()))
        } else {
            Err(TargetError::Malformed(host.to_string()))
        }
    }

    /// The host as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parsed IP address, if the target is an IP literal.
    pub fn ip(&self) -> Option<IpAddr> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Target {
    type Error = TargetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.0
    }
}

fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

/// Why a probe produced no latency.
///
/// Both variants classify identically; the distinction only feeds
/// diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "lowercase")]
pub enum ProbeFailure {
    /// No reply within the timeout.
    Timeout,
    /// Immediate negative signal (resolution failure, refused, no route).
    Unreachable(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Unreachable(reason) => write!(f, "unreachable: {reason}"),
        }
    }
}

/// Result of a single probe: a round-trip time or a failure, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Reply received after the given round-trip time.
    Success(Duration),
    /// No usable reply.
    Failure(ProbeFailure),
}

impl ProbeOutcome {
    /// Successful outcome from a latency in milliseconds.
    ///
    /// Small negative readings (clock skew) are clamped to zero. Non-finite
    /// or out-of-range input is not a measurement and becomes unreachable.
    pub fn from_millis_f64(ms: f64) -> Self {
        if !ms.is_finite() {
            return Self::unreachable(format!("invalid round-trip time: {ms}"));
        }
        match Duration::try_from_secs_f64(ms.max(0.0) / 1000.0) {
            Ok(rtt) => Self::Success(rtt),
            Err(_) => Self::unreachable(format!("round-trip time out of range: {ms}ms")),
        }
    }

    /// Shorthand for a timeout failure.
    pub fn timeout() -> Self {
        Self::Failure(ProbeFailure::Timeout)
    }

    /// Shorthand for an unreachable failure.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Failure(ProbeFailure::Unreachable(reason.into()))
    }

    /// Round-trip time in milliseconds, if the probe succeeded.
    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            Self::Success(rtt) => Some(rtt.as_secs_f64() * 1000.0),
            Self::Failure(_) => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f),
        }
    }
}

/// A single-shot latency measurement against a target.
///
/// Implementations perform exactly one round trip per call and must not
/// retry. Failures are values: `probe` never errors, it reports
/// [`ProbeOutcome::Failure`] instead, so a dead target never stops the
/// monitor.
#[async_trait::async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Short back-end name for logs (e.g. "icmp").
    fn kind(&self) -> &'static str;

    /// Measure one round trip to `target`, giving up after `timeout`.
    async fn probe(&self, target: &Target, timeout: Duration) -> ProbeOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse_ip() {
        let target = Target::parse("8.8.8.8").unwrap();
        assert_eq!(target.as_str(), "8.8.8.8");
        assert!(target.ip().is_some());

        let v6 = Target::parse("::1").unwrap();
        assert_eq!(v6.ip(), Some(IpAddr::V6(std::net::Ipv6Addr::LOCALHOST)));
    }

    #[test]
    fn test_target_parse_hostname() {
        let target = Target::parse("  dns.google  ").unwrap();
        assert_eq!(target.as_str(), "dns.google");
        assert!(target.ip().is_none());

        assert!(Target::parse("localhost").is_ok());
        assert!(Target::parse("example.com.").is_ok());
        assert!(Target::parse("a-b.c-d.example").is_ok());
    }

    #[test]
    fn test_target_parse_empty() {
        assert_eq!(Target::parse(""), Err(TargetError::Empty));
        assert_eq!(Target::parse("   "), Err(TargetError::Empty));
    }

    #[test]
    fn test_target_parse_malformed() {
        for bad in [
            "not a host",
            "-leading.example",
            "trailing-.example",
            "double..dot",
            "under_score.example",
            "http://8.8.8.8",
        ] {
            assert!(
                matches!(Target::parse(bad), Err(TargetError::Malformed(_))),
                "expected '{bad}' to be rejected"
            );
        }

        let long_label = "a".repeat(64);
        assert!(Target::parse(&long_label).is_err());
    }

    #[test]
    fn test_target_serde() {
        let target: Target = serde_json::from_str("\"1.1.1.1\"").unwrap();
        assert_eq!(target.as_str(), "1.1.1.1");
        assert!(serde_json::from_str::<Target>("\"bad host\"").is_err());
        assert_eq!(serde_json::to_string(&target).unwrap(), "\"1.1.1.1\"");
    }

    #[test]
    fn test_outcome_latency() {
        let ok = ProbeOutcome::Success(Duration::from_millis(42));
        assert_eq!(ok.latency_ms(), Some(42.0));
        assert!(ok.failure().is_none());

        let failed = ProbeOutcome::timeout();
        assert_eq!(failed.latency_ms(), None);
        assert_eq!(failed.failure(), Some(&ProbeFailure::Timeout));
    }

    #[test]
    fn test_outcome_from_millis_clamps() {
        assert_eq!(ProbeOutcome::from_millis_f64(-3.0).latency_ms(), Some(0.0));
        let ms = ProbeOutcome::from_millis_f64(12.5).latency_ms().unwrap();
        assert!((ms - 12.5).abs() < 1e-6);
    }

    #[test]
    fn test_outcome_from_millis_rejects_garbage() {
        for ms in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e300] {
            let outcome = ProbeOutcome::from_millis_f64(ms);
            assert_eq!(outcome.latency_ms(), None, "{ms} should not be a reading");
            assert!(matches!(
                outcome.failure(),
                Some(ProbeFailure::Unreachable(_))
            ));
        }
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(ProbeFailure::Timeout.to_string(), "timeout");
        assert_eq!(
            ProbeFailure::Unreachable("connection refused".into()).to_string(),
            "unreachable: connection refused"
        );
    }
}
