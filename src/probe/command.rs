//! System `ping` prober.
//!
//! Runs the platform `ping` binary for a single echo and reads the round
//! trip from its `time=` field. Needs no socket privileges of its own.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::probe::{ProbeOutcome, Prober, Target};

/// Default executable name.
const DEFAULT_PROGRAM: &str = "ping";

/// Exit status `ping` uses when no reply arrived.
const NO_REPLY_EXIT_CODE: i32 = 1;

/// Prober that shells out to the system `ping`.
#[derive(Debug, Clone)]
pub struct CommandProber {
    program: String,
}

impl Default for CommandProber {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandProber {
    /// Use `ping` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Use a specific executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, target: &Target, wait: Duration) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c")
            .arg("1")
            .arg("-W")
            .arg(wait_arg(wait))
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// `-W` is milliseconds on macOS and whole seconds on Linux.
#[cfg(target_os = "macos")]
fn wait_arg(wait: Duration) -> String {
    wait.as_millis().max(1).to_string()
}

#[cfg(not(target_os = "macos"))]
fn wait_arg(wait: Duration) -> String {
    wait.as_secs_f64().ceil().max(1.0).to_string()
}

/// Extract the round trip from `ping` output, e.g. `time=12.3 ms`.
pub(crate) fn parse_ping_time(stdout: &str) -> Option<f64> {
    stdout.lines().find_map(|line| {
        let (_, rest) = line.split_once("time=")?;
        let value: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        value.parse().ok()
    })
}

#[async_trait::async_trait]
impl Prober for CommandProber {
    fn kind(&self) -> &'static str {
        "command"
    }

    async fn probe(&self, target: &Target, probe_timeout: Duration) -> ProbeOutcome {
        let output = match timeout(probe_timeout, self.command(target, probe_timeout).output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!(program = %self.program, error = %e, "Failed to run ping");
                return ProbeOutcome::unreachable(format!("failed to run {}: {e}", self.program));
            }
            Err(_) => {
                tracing::debug!(host = %target, "Ping command timed out");
                return ProbeOutcome::timeout();
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(ms) = parse_ping_time(&stdout) {
            tracing::debug!(host = %target, latency_ms = ms, "Ping probe successful");
            return ProbeOutcome::from_millis_f64(ms);
        }

        if output.status.code() == Some(NO_REPLY_EXIT_CODE) {
            tracing::debug!(host = %target, "Ping got no reply");
            return ProbeOutcome::timeout();
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("ping exited with {}", output.status),
            msg => msg.to_string(),
        };
        tracing::warn!(host = %target, reason = %reason, "Ping probe failed");
        ProbeOutcome::unreachable(reason)
    }
}
