//! Latency thresholds and severity classification.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::probe::ProbeOutcome;

/// Errors raised for rejected threshold input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    /// Pair violates `0 < good_max < warn_max`.
    #[error(
        "invalid thresholds: need 0 < good_max < warn_max, got good_max={good_max}ms warn_max={warn_max}ms"
    )]
    Invalid { good_max: u32, warn_max: u32 },

    /// Text that is neither a preset name nor a pair of numbers.
    #[error("unrecognized thresholds '{0}': expected tight, normal, relaxed or two numbers")]
    Unrecognized(String),
}

/// Badge severity.
///
/// Ordered Good < Warning < Error. `Error` is reserved for probe failure.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    /// At or below `good_max`.
    Good,
    /// Above `good_max`, however high.
    Warning,
    /// Probe failed.
    Error,
}

/// Validated latency bounds in milliseconds, `0 < good_max < warn_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPair")]
pub struct ThresholdPair {
    good_max: u32,
    warn_max: u32,
}

#[derive(Deserialize)]
struct RawPair {
    good_max: u32,
    warn_max: u32,
}

impl TryFrom<RawPair> for ThresholdPair {
    type Error = ThresholdError;

    fn try_from(raw: RawPair) -> Result<Self, Self::Error> {
        Self::new(raw.good_max, raw.warn_max)
    }
}

impl ThresholdPair {
    /// Build a pair, enforcing the ordering invariant.
    ///
    /// # Errors
    /// Returns [`ThresholdError::Invalid`] if `good_max` is zero or not
    /// strictly below `warn_max`.
    pub fn new(good_max: u32, warn_max: u32) -> Result<Self, ThresholdError> {
        if good_max == 0 || good_max >= warn_max {
            return Err(ThresholdError::Invalid { good_max, warn_max });
        }
        Ok(Self { good_max, warn_max })
    }

    /// Upper bound (inclusive) of the Good bucket, in ms.
    pub fn good_max(&self) -> u32 {
        self.good_max
    }

    /// Upper bound (inclusive) of the Warning bucket, in ms.
    pub fn warn_max(&self) -> u32 {
        self.warn_max
    }

    /// The preset this pair equals, if any.
    pub fn preset(&self) -> Option<ThresholdPreset> {
        use strum::IntoEnumIterator;
        ThresholdPreset::iter().find(|p| p.pair() == *self)
    }
}

impl Default for ThresholdPair {
    fn default() -> Self {
        ThresholdPreset::Normal.pair()
    }
}

impl fmt::Display for ThresholdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} ms", self.good_max, self.warn_max)
    }
}

/// Named threshold presets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ThresholdPreset {
    /// 50 / 100 ms.
    Tight,
    /// 100 / 200 ms.
    Normal,
    /// 200 / 500 ms.
    Relaxed,
}

impl TryFrom<String> for ThresholdPreset {
    type Error = ThresholdError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_str(name.trim()).map_err(|_| ThresholdError::Unrecognized(name))
    }
}

impl ThresholdPreset {
    /// Resolved numeric pair.
    pub fn pair(self) -> ThresholdPair {
        let (good_max, warn_max) = match self {
            Self::Tight => (50, 100),
            Self::Normal => (100, 200),
            Self::Relaxed => (200, 500),
        };
        ThresholdPair { good_max, warn_max }
    }
}

/// A threshold request: a preset name or a custom pair, resolved to a
/// [`ThresholdPair`] before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdSpec {
    /// Named preset.
    Preset(ThresholdPreset),
    /// Unvalidated custom pair.
    Custom { good_max: u32, warn_max: u32 },
}

impl Default for ThresholdSpec {
    fn default() -> Self {
        Self::Preset(ThresholdPreset::Normal)
    }
}

impl ThresholdSpec {
    /// Resolve to a validated pair.
    ///
    /// # Errors
    /// Returns [`ThresholdError::Invalid`] for a custom pair breaking the
    /// ordering invariant.
    pub fn resolve(self) -> Result<ThresholdPair, ThresholdError> {
        match self {
            Self::Preset(preset) => Ok(preset.pair()),
            Self::Custom { good_max, warn_max } => ThresholdPair::new(good_max, warn_max),
        }
    }
}

impl From<ThresholdPreset> for ThresholdSpec {
    fn from(preset: ThresholdPreset) -> Self {
        Self::Preset(preset)
    }
}

impl From<ThresholdPair> for ThresholdSpec {
    fn from(pair: ThresholdPair) -> Self {
        Self::Custom {
            good_max: pair.good_max,
            warn_max: pair.warn_max,
        }
    }
}

impl FromStr for ThresholdSpec {
    type Err = ThresholdError;

    /// Accepts `tight`, `Normal`, `80 150`, `80/150` or `80,150`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(preset) = ThresholdPreset::from_str(s) {
            return Ok(Self::Preset(preset));
        }

        let parts: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == '/' || c == ',')
            .filter(|p| !p.is_empty())
            .collect();
        match parts.as_slice() {
            [good, warn] => match (good.parse(), warn.parse()) {
                (Ok(good_max), Ok(warn_max)) => Ok(Self::Custom { good_max, warn_max }),
                _ => Err(ThresholdError::Unrecognized(s.to_string())),
            },
            _ => Err(ThresholdError::Unrecognized(s.to_string())),
        }
    }
}

/// Map a probe outcome to a severity.
///
/// Failure is always `Error`; a reply at or below `good_max` is `Good`;
/// any slower reply is `Warning`. Bounds are inclusive on the better side.
pub fn classify(outcome: &ProbeOutcome, thresholds: &ThresholdPair) -> Severity {
    match outcome {
        ProbeOutcome::Failure(_) => Severity::Error,
        ProbeOutcome::Success(rtt) => {
            if *rtt <= Duration::from_millis(u64::from(thresholds.good_max)) {
                Severity::Good
            } else {
                Severity::Warning
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> ProbeOutcome {
        ProbeOutcome::Success(Duration::from_millis(v))
    }

    #[test]
    fn test_presets() {
        assert_eq!(ThresholdPreset::Tight.pair(), ThresholdPair::new(50, 100).unwrap());
        assert_eq!(ThresholdPreset::Normal.pair(), ThresholdPair::new(100, 200).unwrap());
        assert_eq!(ThresholdPreset::Relaxed.pair(), ThresholdPair::new(200, 500).unwrap());
        assert_eq!(ThresholdPair::default(), ThresholdPreset::Normal.pair());
    }

    #[test]
    fn test_pair_rejects_bad_order() {
        assert_eq!(
            ThresholdPair::new(500, 50),
            Err(ThresholdError::Invalid {
                good_max: 500,
                warn_max: 50
            })
        );
        assert!(ThresholdPair::new(100, 100).is_err());
        assert!(ThresholdPair::new(0, 100).is_err());
        assert!(ThresholdPair::new(1, 2).is_ok());
    }

    #[test]
    fn test_pair_preset_lookup() {
        assert_eq!(
            ThresholdPair::new(200, 500).unwrap().preset(),
            Some(ThresholdPreset::Relaxed)
        );
        assert_eq!(ThresholdPair::new(80, 150).unwrap().preset(), None);
    }

    #[test]
    fn test_normal_scenario() {
        let normal = ThresholdPreset::Normal.pair();
        assert_eq!(classify(&ms(95), &normal), Severity::Good);
        assert_eq!(classify(&ms(150), &normal), Severity::Warning);
        assert_eq!(classify(&ms(450), &normal), Severity::Warning);
        assert_eq!(classify(&ProbeOutcome::timeout(), &normal), Severity::Error);
    }

    #[test]
    fn test_boundaries_belong_to_better_bucket() {
        let normal = ThresholdPreset::Normal.pair();
        assert_eq!(classify(&ms(100), &normal), Severity::Good);
        assert_eq!(classify(&ms(200), &normal), Severity::Warning);
        assert_eq!(
            classify(&ProbeOutcome::Success(Duration::from_micros(100_001)), &normal),
            Severity::Warning
        );
        assert_eq!(classify(&ms(0), &normal), Severity::Good);
    }

    #[test]
    fn test_unreachable_is_error() {
        let tight = ThresholdPreset::Tight.pair();
        assert_eq!(
            classify(&ProbeOutcome::unreachable("no route to host"), &tight),
            Severity::Error
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Good < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::from_str("ERROR").unwrap(), Severity::Error);
    }

    #[test]
    fn test_spec_from_str() {
        assert_eq!(
            ThresholdSpec::from_str("Tight").unwrap(),
            ThresholdSpec::Preset(ThresholdPreset::Tight)
        );
        assert_eq!(
            ThresholdSpec::from_str("80 150").unwrap(),
            ThresholdSpec::Custom {
                good_max: 80,
                warn_max: 150
            }
        );
        assert_eq!(
            ThresholdSpec::from_str(" 80/150 ").unwrap(),
            ThresholdSpec::Custom {
                good_max: 80,
                warn_max: 150
            }
        );
        assert!(ThresholdSpec::from_str("80,150").is_ok());
    }

    #[test]
    fn test_spec_from_str_rejects() {
        for bad in ["", "fast", "80", "80 150 300", "-5 100", "a b"] {
            assert!(
                matches!(ThresholdSpec::from_str(bad), Err(ThresholdError::Unrecognized(_))),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn test_spec_resolve() {
        assert_eq!(
            ThresholdSpec::from(ThresholdPreset::Relaxed).resolve().unwrap(),
            ThresholdPreset::Relaxed.pair()
        );
        let swapped = ThresholdSpec::Custom {
            good_max: 500,
            warn_max: 50,
        };
        assert!(matches!(swapped.resolve(), Err(ThresholdError::Invalid { .. })));
    }

    #[test]
    fn test_spec_serde() {
        let preset: ThresholdSpec = serde_yaml::from_str("relaxed").unwrap();
        assert_eq!(preset, ThresholdSpec::Preset(ThresholdPreset::Relaxed));

        let custom: ThresholdSpec = serde_yaml::from_str("{good_max: 80, warn_max: 150}").unwrap();
        assert_eq!(custom.resolve().unwrap(), ThresholdPair::new(80, 150).unwrap());
    }

    #[test]
    fn test_preset_deserialize_ignores_case() {
        for name in ["Normal", "NORMAL", "normal"] {
            let spec: ThresholdSpec = serde_yaml::from_str(name).unwrap();
            assert_eq!(spec, ThresholdSpec::Preset(ThresholdPreset::Normal));
        }
        assert!(serde_yaml::from_str::<ThresholdPreset>("medium").is_err());
        assert_eq!(
            serde_json::to_string(&ThresholdPreset::Tight).unwrap(),
            "\"tight\""
        );
    }

    #[test]
    fn test_pair_deserialize_validates() {
        assert!(serde_yaml::from_str::<ThresholdPair>("{good_max: 80, warn_max: 150}").is_ok());
        assert!(serde_yaml::from_str::<ThresholdPair>("{good_max: 150, warn_max: 80}").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pairs() -> impl Strategy<Value = ThresholdPair> {
        (1u32..10_000, 1u32..10_000)
            .prop_map(|(good, gap)| ThresholdPair::new(good, good + gap).unwrap())
    }

    proptest! {
        #[test]
        fn test_at_or_below_good_is_good(pair in pairs(), frac in 0.0f64..=1.0) {
            let micros = (f64::from(pair.good_max()) * 1000.0 * frac).floor() as u64;
            let outcome = ProbeOutcome::Success(Duration::from_micros(micros));
            prop_assert_eq!(classify(&outcome, &pair), Severity::Good);
        }

        #[test]
        fn test_above_good_is_warning(pair in pairs(), extra_micros in 1u64..100_000_000) {
            let micros = u64::from(pair.good_max()) * 1000 + extra_micros;
            let outcome = ProbeOutcome::Success(Duration::from_micros(micros));
            prop_assert_eq!(classify(&outcome, &pair), Severity::Warning);
        }

        #[test]
        fn test_failure_is_error(pair in pairs(), timed_out in any::<bool>()) {
            let outcome = if timed_out {
                ProbeOutcome::timeout()
            } else {
                ProbeOutcome::unreachable("host unreachable")
            };
            prop_assert_eq!(classify(&outcome, &pair), Severity::Error);
        }

        #[test]
        fn test_invalid_pairs_rejected(good in 0u32..10_000, warn in 0u32..10_000) {
            prop_assume!(good == 0 || good >= warn);
            prop_assert!(ThresholdPair::new(good, warn).is_err());
        }
    }
}
