//! Monitor facade for the presentation layer.

use std::sync::Arc;
use std::time::Duration;

use crate::monitor::command::Command;
use crate::monitor::error::MonitorError;
use crate::monitor::scheduler::{Scheduler, SchedulerState};
use crate::monitor::settings::{Settings, SettingsStore};
use crate::monitor::status::{Status, StatusPublisher, StatusWatch};
use crate::monitor::thresholds::{ThresholdPair, ThresholdSpec};
use crate::probe::{Prober, Target};

/// Collaborator that registers the app to launch at login.
///
/// The monitor only invokes it; the OS-level mechanism lives outside.
pub trait AutostartHook: Send + Sync + 'static {
    /// Register (`true`) or unregister (`false`) launch at login.
    fn register(&self, enabled: bool) -> std::io::Result<()>;
}

/// Autostart hook that records nothing outside the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAutostart;

impl AutostartHook for NoopAutostart {
    fn register(&self, enabled: bool) -> std::io::Result<()> {
        tracing::info!(enabled, "No autostart collaborator installed, preference kept in memory");
        Ok(())
    }
}

/// Latency monitor: settings store, status publisher and scheduler wired
/// together behind one handle.
///
/// Every method is safe to call from any thread while the probe loop runs;
/// none of them waits on network I/O.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use pingbar::{IcmpProber, Monitor, Settings, ThresholdPreset};
///
/// # async fn run() -> Result<(), pingbar::MonitorError> {
/// let monitor = Monitor::new(Settings::default(), Arc::new(IcmpProber::new()));
/// monitor.start()?;
/// monitor.set_target("1.1.1.1")?;
/// monitor.set_thresholds(ThresholdPreset::Tight.into())?;
///
/// let mut watch = monitor.subscribe();
/// if let Some(status) = watch.changed().await {
///     println!("{}", status.describe());
/// }
/// monitor.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Monitor {
    settings: Arc<SettingsStore>,
    status: Arc<StatusPublisher>,
    scheduler: Scheduler,
    autostart: Arc<dyn AutostartHook>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("settings", &self.settings.snapshot())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Create an idle monitor.
    pub fn new(initial: Settings, prober: Arc<dyn Prober>) -> Self {
        let settings = Arc::new(SettingsStore::new(initial));
        let status = Arc::new(StatusPublisher::new());
        let scheduler = Scheduler::new(Arc::clone(&settings), Arc::clone(&status), prober);
        Self {
            settings,
            status,
            scheduler,
            autostart: Arc::new(NoopAutostart),
        }
    }

    /// Set the per-probe timeout (clamped to `MAX_PROBE_TIMEOUT`).
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.scheduler = self.scheduler.with_probe_timeout(timeout);
        self
    }

    /// Install the autostart collaborator.
    pub fn with_autostart_hook(mut self, hook: Arc<dyn AutostartHook>) -> Self {
        self.autostart = hook;
        self
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Arc<Settings> {
        self.settings.snapshot()
    }

    /// Most recently published status.
    pub fn status(&self) -> Status {
        self.status.current()
    }

    /// Watch for status changes.
    pub fn subscribe(&self) -> StatusWatch {
        self.status.subscribe()
    }

    /// Scheduler lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Per-probe timeout in effect.
    pub fn probe_timeout(&self) -> Duration {
        self.scheduler.probe_timeout()
    }

    /// Change the probed host.
    ///
    /// # Errors
    /// `InvalidTarget` for blank or malformed input; the old target stays.
    pub fn set_target(&self, host: &str) -> Result<Target, MonitorError> {
        let target = Target::parse(host).inspect_err(|e| {
            tracing::warn!(input = %host, error = %e, "Rejected target update");
        })?;
        self.settings.set_target(target.clone());
        tracing::info!(host = %target, "Target updated");
        Ok(target)
    }

    /// Change both thresholds at once.
    ///
    /// # Errors
    /// `InvalidThresholds` if the pair is out of order; the old pair stays.
    pub fn set_thresholds(&self, spec: ThresholdSpec) -> Result<ThresholdPair, MonitorError> {
        let pair = spec.resolve().inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected threshold update");
        })?;
        self.settings.set_thresholds(pair);
        tracing::info!(
            good_max = pair.good_max(),
            warn_max = pair.warn_max(),
            "Thresholds updated"
        );
        Ok(pair)
    }

    /// Change the autostart preference.
    ///
    /// The hook runs first; the flag is only stored if it succeeds.
    ///
    /// # Errors
    /// `Autostart` if the collaborator fails.
    pub fn set_autostart(&self, enabled: bool) -> Result<(), MonitorError> {
        self.autostart.register(enabled).inspect_err(|e| {
            tracing::warn!(enabled, error = %e, "Autostart registration failed");
        })?;
        self.settings.set_autostart(enabled);
        tracing::info!(enabled, "Autostart updated");
        Ok(())
    }

    /// Start the probe loop.
    ///
    /// # Errors
    /// `AlreadyRunning` or `Runtime`, see [`Scheduler::start`].
    pub fn start(&self) -> Result<(), MonitorError> {
        self.scheduler.start()
    }

    /// Stop the probe loop; returns immediately.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Stop and wait for the loop task to finish.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    /// Apply a presentation-layer command.
    ///
    /// # Errors
    /// Whatever the underlying operation returns.
    pub fn apply(&self, command: Command) -> Result<(), MonitorError> {
        tracing::debug!(command = command.as_ref(), "Applying command");
        match command {
            Command::SetTarget(host) => self.set_target(&host).map(drop),
            Command::SetThresholds(spec) => self.set_thresholds(spec).map(drop),
            Command::SetAutostart(enabled) => self.set_autostart(enabled),
            Command::Start => self.start(),
            Command::Stop => {
                self.stop();
                Ok(())
            }
        }
    }
}
