//! pingbar Binary Entry Point
//!
//! Runs the latency monitor in the terminal: a colored badge per status
//! change on stdout, console commands on stdin.
//! Core functionality is provided by the `pingbar` library crate.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use pingbar::{
    Badge, Command, Monitor, Status,
    config::{AppConfig, DEFAULT_CONFIG_PATH, ProbeMethod, parse_duration},
    console::{ConsoleLine, HELP},
    logging,
    monitor::{PROBE_SLACK, ThresholdSpec},
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// pingbar - Latency Monitor
#[derive(Parser, Debug)]
#[command(name = "pingbar", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file [default: pingbar.yaml, optional]
    #[arg(short, long, env = "PINGBAR_CONFIG")]
    config: Option<PathBuf>,

    /// Host or known target name to probe (overrides config file)
    #[arg(long, env = "PINGBAR_TARGET")]
    target: Option<String>,

    /// Preset (tight, normal, relaxed) or "GOOD WARN" in ms (overrides config file)
    #[arg(long)]
    thresholds: Option<ThresholdSpec>,

    /// Probe method: icmp, command or tcp (overrides config file)
    #[arg(long)]
    method: Option<ProbeMethod>,

    /// Port for the tcp method (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// Per-probe timeout, e.g. 1500ms (overrides config file)
    #[arg(long, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Print the first status and exit
    #[arg(long)]
    once: bool,

    /// Print statuses as JSON lines instead of badges
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Read configuration; only an explicitly named file must exist.
    // Validation waits until logging is up so its warnings are kept.
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let source = match &cli.config {
        Some(path) => Some(path.as_path()),
        None => default_path.exists().then_some(default_path),
    };
    let mut config = match source {
        Some(path) => AppConfig::read(path)?,
        None => AppConfig::default(),
    };

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(target) = &cli.target {
        config.monitor.target = config.resolve_target(target).to_string();
    }
    if let Some(spec) = cli.thresholds {
        config.monitor.thresholds = spec;
    }
    if let Some(method) = cli.method {
        config.probe.method = method;
    }
    if let Some(port) = cli.port {
        config.probe.port = Some(port);
    }
    if let Some(timeout) = cli.timeout {
        config.probe.timeout = timeout;
    }

    logging::init(&config.logging)?;
    tracing::info!("pingbar - Latency Monitor");
    match source {
        Some(path) => tracing::info!("Loaded configuration from: {}", path.display()),
        None => tracing::info!("No config file at {}, using defaults", DEFAULT_CONFIG_PATH),
    }
    config.validate()?;

    let settings = config.settings()?;
    tracing::info!(
        "Target: {}, thresholds: {}, probe: {} (timeout {:?})",
        settings.target,
        settings.thresholds,
        config.probe.method,
        config.probe.timeout,
    );

    let monitor = Monitor::new(settings, config.probe.build()?)
        .with_probe_timeout(config.probe.timeout);
    let mut watch = monitor.subscribe();
    monitor.start()?;

    if cli.once {
        let wait = monitor.probe_timeout() + PROBE_SLACK * 2;
        let status = tokio::time::timeout(wait, watch.changed())
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| monitor.status());
        monitor.shutdown().await;
        print_status(&status, cli.json)?;
        return Ok(if status.failure.is_some() || status.is_unknown() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    if !cli.json {
        eprintln!("Type 'help' for commands. Press Ctrl+C to quit.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = watch.changed() => match changed {
                Some(status) => print_status(&status, cli.json)?,
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !handle_line(&line, &monitor, &config)? {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!("stdin closed, running until signalled");
                    stdin_open = false;
                }
                Err(e) => {
                    tracing::warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
        }
    }

    tracing::info!("Shutting down monitor...");
    monitor.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(ExitCode::SUCCESS)
}

/// Print one status as a badge line or a JSON object.
fn print_status(status: &Status, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(status)?);
        return Ok(());
    }

    let badge = Badge::from(status);
    match &status.target {
        Some(target) => println!("{} {} ({})", badge.render(), target, status.describe()),
        None => println!("{} {}", badge.render(), status.describe()),
    }
    Ok(())
}

/// Handle one console line. Returns `false` when the user quits.
fn handle_line(
    line: &str,
    monitor: &Monitor,
    config: &AppConfig,
) -> Result<bool, serde_json::Error> {
    let parsed = match line.parse::<ConsoleLine>() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            return Ok(true);
        }
    };

    match parsed {
        ConsoleLine::Empty => {}
        ConsoleLine::Monitor(command) => {
            let command = match command {
                Command::SetTarget(host) => {
                    Command::SetTarget(config.resolve_target(&host).to_string())
                }
                other => other,
            };
            if let Err(e) = monitor.apply(command) {
                eprintln!("error: {e}");
            }
        }
        ConsoleLine::ShowStatus => {
            let status = monitor.status();
            eprintln!("{} [{}]", status.describe(), monitor.state());
        }
        ConsoleLine::ShowSettings => {
            eprintln!("{}", serde_json::to_string_pretty(&*monitor.settings())?);
        }
        ConsoleLine::ListTargets => {
            for known in &config.targets {
                eprintln!("{:<12} {:<16} {}", known.name, known.host, known.label);
            }
        }
        ConsoleLine::Help => eprintln!("{HELP}"),
        ConsoleLine::Quit => return Ok(false),
    }
    Ok(true)
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
