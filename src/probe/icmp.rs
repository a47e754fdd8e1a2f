//! ICMP echo prober.
//!
//! Measures ICMP ping latency to a target host.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tokio::time::timeout;

use crate::probe::{ProbeOutcome, Prober, Target};

/// Echo payload; 56 bytes like the system `ping`.
const PAYLOAD: [u8; 56] = [0; 56];

/// ICMP echo prober.
///
/// Opens a fresh ICMP socket per probe, so a target switch between ticks
/// needs no teardown. Creating the socket may need privileges; that failure
/// is reported as unreachable rather than aborting the monitor.
#[derive(Debug, Default, Clone, Copy)]
pub struct IcmpProber;

impl IcmpProber {
    /// Create a new ICMP prober.
    pub fn new() -> Self {
        Self
    }
}

/// Resolve hostname to IP address.
pub(crate) async fn resolve_host(host: &str) -> Result<IpAddr, std::io::Error> {
    // First, try to parse as an IP address directly
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs = tokio::net::lookup_host(format!("{host}:0")).await?;
    addrs
        .into_iter()
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"))
}

#[async_trait::async_trait]
impl Prober for IcmpProber {
    fn kind(&self) -> &'static str {
        "icmp"
    }

    async fn probe(&self, target: &Target, probe_timeout: Duration) -> ProbeOutcome {
        let started = Instant::now();

        let ip_addr = match timeout(probe_timeout, resolve_host(target.as_str())).await {
            Ok(Ok(ip)) => ip,
            Ok(Err(e)) => {
                tracing::warn!(host = %target, error = %e, "Failed to resolve hostname");
                return ProbeOutcome::unreachable(format!("dns resolution failed: {e}"));
            }
            Err(_) => {
                tracing::warn!(host = %target, "Hostname resolution timed out");
                return ProbeOutcome::timeout();
            }
        };

        let client = match ip_addr {
            IpAddr::V4(_) => Client::new(&Config::default()),
            IpAddr::V6(_) => Client::new(&Config::builder().kind(ICMP::V6).build()),
        };
        let client = match client {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(host = %target, error = %e, "Failed to create ICMP client");
                return ProbeOutcome::unreachable(format!("icmp socket unavailable: {e}"));
            }
        };

        // Resolution already spent part of the budget
        let remaining = probe_timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return ProbeOutcome::timeout();
        }

        let mut pinger = client.pinger(ip_addr, PingIdentifier(rand::random())).await;
        pinger.timeout(remaining);

        match timeout(remaining, pinger.ping(PingSequence(0), &PAYLOAD)).await {
            Ok(Ok((_, rtt))) => {
                tracing::debug!(
                    host = %target,
                    latency_ms = rtt.as_secs_f64() * 1000.0,
                    "Ping probe successful"
                );
                ProbeOutcome::Success(rtt)
            }
            Ok(Err(SurgeError::Timeout { .. })) | Err(_) => {
                tracing::debug!(
                    host = %target,
                    timeout_ms = probe_timeout.as_millis(),
                    "Ping probe timed out"
                );
                ProbeOutcome::timeout()
            }
            Ok(Err(e)) => {
                tracing::warn!(host = %target, error = %e, "Ping probe failed");
                ProbeOutcome::unreachable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_host_ipv4() {
        let ip = resolve_host("127.0.0.1").await.unwrap();
        assert_eq!(ip, IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)));
    }

    #[tokio::test]
    async fn test_resolve_host_ipv6() {
        let ip = resolve_host("::1").await.unwrap();
        assert_eq!(ip, IpAddr::V6(std::net::Ipv6Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_icmp_probe_never_exceeds_timeout() {
        // Works with or without ICMP privileges: either a reply, a timeout,
        // or an unreachable outcome, all within the bound.
        let target = Target::parse("127.0.0.1").unwrap();
        let budget = Duration::from_millis(500);
        let started = Instant::now();
        let _ = IcmpProber::new().probe(&target, budget).await;
        assert!(started.elapsed() < budget + Duration::from_millis(500));
    }
}
