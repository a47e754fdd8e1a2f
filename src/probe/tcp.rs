//! TCP connect prober.
//!
//! Measures TCP connection latency to a target host and port.

use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::probe::{ProbeOutcome, Prober, Target};

/// TCP connect prober.
///
/// Useful where ICMP is filtered: the connect handshake time stands in for
/// the round trip.
#[derive(Debug, Clone, Copy)]
pub struct TcpProber {
    port: u16,
}

impl TcpProber {
    /// Create a prober connecting to `port` on the target.
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Destination port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait::async_trait]
impl Prober for TcpProber {
    fn kind(&self) -> &'static str {
        "tcp"
    }

    async fn probe(&self, target: &Target, probe_timeout: Duration) -> ProbeOutcome {
        let start = Instant::now();
        let result = timeout(
            probe_timeout,
            TcpStream::connect((target.as_str(), self.port)),
        )
        .await;
        let elapsed = start.elapsed();

        match result {
            Ok(Ok(_stream)) => {
                tracing::debug!(
                    host = %target,
                    port = self.port,
                    latency_ms = elapsed.as_secs_f64() * 1000.0,
                    "TCP probe successful"
                );
                ProbeOutcome::Success(elapsed)
            }
            Ok(Err(e)) => {
                tracing::warn!(host = %target, port = self.port, error = %e, "TCP probe failed");
                ProbeOutcome::unreachable(e.to_string())
            }
            Err(_) => {
                tracing::debug!(
                    host = %target,
                    port = self.port,
                    timeout_ms = probe_timeout.as_millis(),
                    "TCP probe timed out"
                );
                ProbeOutcome::timeout()
            }
        }
    }
}
