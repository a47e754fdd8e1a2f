//! Monitor Integration Tests for pingbar
//!
//! Drives the whole monitor (config, TCP prober, scheduler, classifier and
//! publisher) against listeners on the loopback interface.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use pingbar::{
    AppConfig, Badge, BadgeColor, Monitor, MonitorError, ProbeFailure, SchedulerState, Settings,
    Severity, Status, StatusWatch, Target, TcpProber, ThresholdPreset, ThresholdSpec,
};
use tokio::net::TcpListener;

// =============================================================================
// Test Helpers
// =============================================================================

/// Bind a listener on a random loopback port.
async fn open_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().expect("Failed to get local addr").port();
    (listener, port)
}

/// A loopback port with nothing listening.
async fn closed_port() -> u16 {
    let (listener, port) = open_port().await;
    drop(listener);
    port
}

fn loopback_settings() -> Settings {
    Settings {
        target: Target::parse("127.0.0.1").unwrap(),
        thresholds: ThresholdPreset::Relaxed.pair(),
        autostart: false,
    }
}

/// Wait for the next published status, failing the test after five seconds.
async fn next_status(watch: &mut StatusWatch) -> Status {
    tokio::time::timeout(Duration::from_secs(5), watch.changed())
        .await
        .expect("no status published within 5s")
        .expect("status channel closed")
}

// =============================================================================
// Probe Results
// =============================================================================

#[tokio::test]
async fn test_open_port_is_good() {
    let (_listener, port) = open_port().await;
    let monitor = Monitor::new(loopback_settings(), Arc::new(TcpProber::new(port)))
        .with_probe_timeout(Duration::from_secs(1));
    let mut watch = monitor.subscribe();

    monitor.start().unwrap();
    let status = next_status(&mut watch).await;
    monitor.shutdown().await;

    assert_eq!(status.severity, Some(Severity::Good));
    assert!(status.latency_ms.is_some());
    assert!(status.failure.is_none());
    assert_eq!(status.target.as_ref().map(Target::as_str), Some("127.0.0.1"));
    assert_eq!(Badge::from(&status).color, BadgeColor::Green);
    assert_eq!(monitor.state(), SchedulerState::Stopped);
}

#[tokio::test]
async fn test_closed_port_is_error() {
    let port = closed_port().await;
    let monitor = Monitor::new(loopback_settings(), Arc::new(TcpProber::new(port)))
        .with_probe_timeout(Duration::from_secs(1));
    let mut watch = monitor.subscribe();

    monitor.start().unwrap();
    let status = next_status(&mut watch).await;
    monitor.shutdown().await;

    assert_eq!(status.severity, Some(Severity::Error));
    assert_eq!(status.latency_ms, None);
    assert!(matches!(status.failure, Some(ProbeFailure::Unreachable(_))));
    assert_eq!(Badge::from(&status).text, "Err");
}

#[tokio::test]
async fn test_status_before_start_is_unknown() {
    let monitor = Monitor::new(loopback_settings(), Arc::new(TcpProber::new(9)));
    let status = monitor.status();
    assert!(status.is_unknown());
    assert_eq!(status.describe(), "waiting");
    assert_eq!(monitor.state(), SchedulerState::Idle);
}

// =============================================================================
// Settings While Running
// =============================================================================

#[tokio::test]
async fn test_rejected_thresholds_keep_running_settings() {
    let (_listener, port) = open_port().await;
    let monitor = Monitor::new(loopback_settings(), Arc::new(TcpProber::new(port)));
    let mut watch = monitor.subscribe();
    monitor.start().unwrap();

    let result = monitor.set_thresholds(ThresholdSpec::Custom {
        good_max: 500,
        warn_max: 50,
    });
    assert!(matches!(result, Err(MonitorError::InvalidThresholds(_))));
    assert_eq!(monitor.settings().thresholds, ThresholdPreset::Relaxed.pair());

    let status = next_status(&mut watch).await;
    assert_eq!(status.severity, Some(Severity::Good));
    assert_eq!(monitor.state(), SchedulerState::Running);
    monitor.shutdown().await;
}

#[tokio::test]
async fn test_restart_after_stop() {
    let (_listener, port) = open_port().await;
    let monitor = Monitor::new(loopback_settings(), Arc::new(TcpProber::new(port)));
    let mut watch = monitor.subscribe();

    monitor.start().unwrap();
    next_status(&mut watch).await;
    monitor.shutdown().await;
    assert_eq!(monitor.state(), SchedulerState::Stopped);

    monitor.start().unwrap();
    assert_eq!(monitor.state(), SchedulerState::Running);
    let status = next_status(&mut watch).await;
    assert_eq!(status.severity, Some(Severity::Good));
    monitor.shutdown().await;
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_monitor_from_yaml_config() {
    let (_listener, port) = open_port().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
monitor:
  target: home
  thresholds: relaxed
probe:
  method: tcp
  port: {port}
  timeout: 1s
targets:
  - name: home
    label: Loopback
    host: 127.0.0.1
"#
    )
    .unwrap();

    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.monitor.target, "127.0.0.1");

    let monitor = Monitor::new(config.settings().unwrap(), config.probe.build().unwrap())
        .with_probe_timeout(config.probe.timeout);
    assert_eq!(monitor.probe_timeout(), Duration::from_secs(1));

    let mut watch = monitor.subscribe();
    monitor.start().unwrap();
    let status = next_status(&mut watch).await;
    monitor.shutdown().await;

    assert_eq!(status.severity, Some(Severity::Good));
    assert_eq!(status.target.as_ref().map(Target::as_str), Some("127.0.0.1"));
}

#[test]
fn test_invalid_yaml_config_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "probe:\n  method: tcp").unwrap();
    assert!(AppConfig::load(file.path()).is_err());
}
