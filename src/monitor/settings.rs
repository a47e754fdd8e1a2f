//! Runtime settings and their lock-free store.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::monitor::thresholds::ThresholdPair;
use crate::probe::Target;

/// Target used when none is configured (Google public DNS).
pub const DEFAULT_TARGET: &str = "8.8.8.8";

/// Process-wide monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Host to probe.
    pub target: Target,
    /// Severity bounds.
    pub thresholds: ThresholdPair,
    /// Whether the app should launch at login.
    pub autostart: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: Target::parse(DEFAULT_TARGET).expect("default target is a valid IP"),
            thresholds: ThresholdPair::default(),
            autostart: false,
        }
    }
}

/// Copy-on-write holder for [`Settings`].
///
/// Readers get an immutable snapshot that later updates never touch, so a
/// probe in flight keeps the target it started with. Writers swap in a
/// whole new value; they never wait on readers or on network I/O.
#[derive(Debug)]
pub struct SettingsStore {
    current: ArcSwap<Settings>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStore {
    /// Create a store seeded with `initial`.
    pub fn new(initial: Settings) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Current settings.
    pub fn snapshot(&self) -> Arc<Settings> {
        self.current.load_full()
    }

    /// Replace the target.
    pub fn set_target(&self, target: Target) {
        self.update(|s| s.target = target.clone());
    }

    /// Replace both thresholds as one unit.
    pub fn set_thresholds(&self, thresholds: ThresholdPair) {
        self.update(|s| s.thresholds = thresholds);
    }

    /// Replace the autostart flag.
    pub fn set_autostart(&self, autostart: bool) {
        self.update(|s| s.autostart = autostart);
    }

    // rcu retries against concurrent writers so no field update is lost
    fn update(&self, apply: impl Fn(&mut Settings)) {
        self.current.rcu(|current| {
            let mut next = Settings::clone(current);
            apply(&mut next);
            next
        });
    }
}
