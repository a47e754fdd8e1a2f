//! Probe scheduler: snapshot, probe, classify, publish on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use strum_macros::{AsRefStr, Display};
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::monitor::error::MonitorError;
use crate::monitor::settings::SettingsStore;
use crate::monitor::status::{Status, StatusPublisher};
use crate::monitor::thresholds::classify;
use crate::probe::{ProbeOutcome, Prober};

/// Fixed tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(2);

/// Grace added on top of the probe timeout before the scheduler gives up
/// on a prober that ignores its own bound.
pub const PROBE_SLACK: Duration = Duration::from_millis(250);

/// Largest per-probe timeout. With [`PROBE_SLACK`] on top, a probe is
/// always over by the next tick.
pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_millis(1750);

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = MAX_PROBE_TIMEOUT;

/// Default timeout for graceful shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SchedulerState {
    /// Never started.
    Idle,
    /// Probe loop active.
    Running,
    /// Stopped; the last status stays published.
    Stopped,
}

enum Lifecycle {
    Idle,
    Running {
        cancel: CancellationToken,
        task: JoinHandle<()>,
    },
    Stopped,
}

/// Everything a tick needs, shared between the loop and its probe tasks.
struct TickContext {
    settings: Arc<SettingsStore>,
    status: Arc<StatusPublisher>,
    prober: Arc<dyn Prober>,
    period: Duration,
    probe_timeout: Duration,
    /// Held by the probe task for its whole run; one probe at a time.
    in_flight: Arc<tokio::sync::Mutex<()>>,
    /// Serializes publish against stop so nothing lands after `stop()`.
    publish_gate: Mutex<()>,
}

/// Drives periodic probes and publishes their classified results.
///
/// Ticks follow absolute deadlines and never wait for the probe, so slow
/// probes cannot push later ticks back. A tick that finds the previous
/// probe still outstanding is skipped.
pub struct Scheduler {
    ctx: Arc<TickContext>,
    lifecycle: Mutex<Lifecycle>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state())
            .field("prober", &self.ctx.prober.kind())
            .field("period", &self.ctx.period)
            .field("probe_timeout", &self.ctx.probe_timeout)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create an idle scheduler with the default period and timeout.
    pub fn new(
        settings: Arc<SettingsStore>,
        status: Arc<StatusPublisher>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            ctx: Arc::new(TickContext {
                settings,
                status,
                prober,
                period: TICK_PERIOD,
                probe_timeout: DEFAULT_PROBE_TIMEOUT,
                in_flight: Arc::new(tokio::sync::Mutex::new(())),
                publish_gate: Mutex::new(()),
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Set the per-probe timeout.
    ///
    /// Clamped to `(0, MAX_PROBE_TIMEOUT]` so a probe plus its slack always
    /// ends by the next tick. Ignored once the scheduler has been started.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        let timeout = if timeout.is_zero() || timeout > MAX_PROBE_TIMEOUT {
            tracing::warn!(
                requested_ms = timeout.as_millis(),
                max_ms = MAX_PROBE_TIMEOUT.as_millis(),
                "Probe timeout outside (0, max]. Using the maximum."
            );
            MAX_PROBE_TIMEOUT
        } else {
            timeout
        };
        match Arc::get_mut(&mut self.ctx) {
            Some(ctx) => ctx.probe_timeout = timeout,
            None => tracing::warn!(
                requested_ms = timeout.as_millis(),
                current_ms = self.ctx.probe_timeout.as_millis(),
                "Scheduler already started, probe timeout unchanged"
            ),
        }
        self
    }

    /// Per-probe timeout in effect.
    pub fn probe_timeout(&self) -> Duration {
        self.ctx.probe_timeout
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.ctx.period
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        match &*self.lifecycle.lock() {
            Lifecycle::Idle => SchedulerState::Idle,
            Lifecycle::Running { .. } => SchedulerState::Running,
            Lifecycle::Stopped => SchedulerState::Stopped,
        }
    }

    /// Start the probe loop. The first tick fires immediately.
    ///
    /// # Errors
    /// `AlreadyRunning` if the loop is active; `Runtime` outside tokio.
    pub fn start(&self) -> Result<(), MonitorError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MonitorError::Runtime(e.to_string()))?;

        let mut lifecycle = self.lifecycle.lock();
        if matches!(*lifecycle, Lifecycle::Running { .. }) {
            return Err(MonitorError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let task = runtime.spawn(run_loop(Arc::clone(&self.ctx), cancel.clone()));
        *lifecycle = Lifecycle::Running { cancel, task };

        tracing::info!(
            prober = self.ctx.prober.kind(),
            period_ms = self.ctx.period.as_millis(),
            timeout_ms = self.ctx.probe_timeout.as_millis(),
            "Probe scheduler started"
        );
        Ok(())
    }

    /// Stop the probe loop.
    ///
    /// Returns promptly. An in-flight probe may finish in the background
    /// but its result is discarded; the last published status stays.
    /// Stopping an idle or stopped scheduler is a no-op.
    pub fn stop(&self) {
        // The loop task exits on its own at its next poll
        self.halt();
    }

    /// Stop and wait for the loop task to exit, with default timeout.
    pub async fn shutdown(&self) {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await;
    }

    /// Stop and wait for the loop task to exit.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) {
        let Some(task) = self.halt() else {
            return;
        };
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(())) => tracing::info!("Probe scheduler shutdown complete"),
            Ok(Err(e)) => tracing::error!(error = %e, "Probe loop task failed"),
            Err(_) => tracing::warn!("Probe scheduler shutdown timed out"),
        }
    }

    fn halt(&self) -> Option<JoinHandle<()>> {
        let mut lifecycle = self.lifecycle.lock();
        let Lifecycle::Running { cancel, .. } = &*lifecycle else {
            return None;
        };
        {
            let _gate = self.ctx.publish_gate.lock();
            cancel.cancel();
        }
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running { task, .. } => {
                tracing::info!("Probe scheduler stopped");
                Some(task)
            }
            _ => None,
        }
    }
}

async fn run_loop(ctx: Arc<TickContext>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(ctx.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let bound = ctx.probe_timeout + PROBE_SLACK;
    // Hard deadline of the last probe this loop launched
    let mut outstanding_until: Option<Instant> = None;

    loop {
        let tick = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            tick = ticker.tick() => tick,
        };

        let permit = match Arc::clone(&ctx.in_flight).try_lock_owned() {
            Ok(permit) => permit,
            Err(_) if outstanding_until.is_some_and(|until| until <= tick) => {
                // Past its bound: the probe is being cut off right now
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    permit = Arc::clone(&ctx.in_flight).lock_owned() => permit,
                }
            }
            Err(_) => {
                tracing::debug!("Previous probe still in flight, skipping tick");
                continue;
            }
        };
        outstanding_until = Some(tick + bound);
        tokio::spawn(run_tick(Arc::clone(&ctx), permit, cancel.clone()));
    }

    tracing::debug!("Probe loop exited");
}

/// Execute a single tick and publish the result unless stopped meanwhile.
async fn run_tick(ctx: Arc<TickContext>, _permit: OwnedMutexGuard<()>, cancel: CancellationToken) {
    let settings = ctx.settings.snapshot();
    let target = settings.target.clone();

    let bound = ctx.probe_timeout + PROBE_SLACK;
    let outcome = match tokio::time::timeout(bound, ctx.prober.probe(&target, ctx.probe_timeout))
        .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(
                host = %target,
                prober = ctx.prober.kind(),
                bound_ms = bound.as_millis(),
                "Prober overran its timeout"
            );
            ProbeOutcome::timeout()
        }
    };

    let severity = classify(&outcome, &settings.thresholds);
    tracing::debug!(
        host = %target,
        severity = %severity,
        latency_ms = outcome.latency_ms(),
        "Probe classified"
    );

    let _gate = ctx.publish_gate.lock();
    if cancel.is_cancelled() {
        tracing::debug!(host = %target, "Stopped during probe, discarding result");
        return;
    }
    ctx.status.publish(Status::observed(target, &outcome, severity));
}
