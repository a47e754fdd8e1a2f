//! Current status and its single-slot publisher.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::monitor::thresholds::Severity;
use crate::probe::{ProbeFailure, ProbeOutcome, Target};

/// The latest classified measurement.
///
/// `severity` is `None` only for the initial unknown status. Failed probes
/// carry no latency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub severity: Option<Severity>,
    pub latency_ms: Option<f64>,
    pub failure: Option<ProbeFailure>,
    pub target: Option<Target>,
    pub captured_at: DateTime<Utc>,
}

impl Status {
    /// Placeholder before the first probe completes.
    pub fn unknown() -> Self {
        Self {
            severity: None,
            latency_ms: None,
            failure: None,
            target: None,
            captured_at: Utc::now(),
        }
    }

    /// Status for a classified probe outcome.
    pub fn observed(target: Target, outcome: &ProbeOutcome, severity: Severity) -> Self {
        Self {
            severity: Some(severity),
            latency_ms: outcome.latency_ms(),
            failure: outcome.failure().cloned(),
            target: Some(target),
            captured_at: Utc::now(),
        }
    }

    /// Whether any probe has completed yet.
    pub fn is_unknown(&self) -> bool {
        self.severity.is_none()
    }

    /// Short diagnostic text: `23ms`, `timeout`, `unreachable: …` or `waiting`.
    pub fn describe(&self) -> String {
        match (&self.latency_ms, &self.failure) {
            (Some(ms), _) => format!("{ms:.0}ms"),
            (None, Some(failure)) => failure.to_string(),
            (None, None) => "waiting".to_string(),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Single-slot, lock-free holder for the current [`Status`].
///
/// Each publish replaces the whole value and bumps a generation counter
/// that subscribers wait on. History is not kept.
#[derive(Debug)]
pub struct StatusPublisher {
    slot: ArcSwap<Status>,
    generation: watch::Sender<u64>,
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPublisher {
    /// Create a publisher holding [`Status::unknown`].
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            slot: ArcSwap::from_pointee(Status::unknown()),
            generation,
        }
    }

    /// Overwrite the current status.
    pub fn publish(&self, status: Status) {
        self.slot.store(Arc::new(status));
        self.generation.send_modify(|g| *g += 1);
    }

    /// Copy of the most recently published status.
    pub fn current(&self) -> Status {
        Status::clone(&self.slot.load())
    }

    /// Number of publishes so far.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Watch for future publishes.
    pub fn subscribe(self: &Arc<Self>) -> StatusWatch {
        StatusWatch {
            rx: self.generation.subscribe(),
            publisher: Arc::clone(self),
        }
    }
}

/// Subscription to status changes.
///
/// Publishes that land between two `changed` calls are coalesced; the
/// caller always gets the newest status.
#[derive(Debug)]
pub struct StatusWatch {
    rx: watch::Receiver<u64>,
    publisher: Arc<StatusPublisher>,
}

impl StatusWatch {
    /// Wait for the next publish and return the newest status.
    ///
    /// Returns `None` if the generation channel has closed.
    pub async fn changed(&mut self) -> Option<Status> {
        self.rx.changed().await.ok()?;
        Some(self.publisher.current())
    }

    /// The newest status without waiting.
    pub fn current(&self) -> Status {
        self.publisher.current()
    }
}
