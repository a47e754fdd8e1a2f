//! Probe Layer
//!
//! One-shot latency measurements behind the [`Prober`] trait. Each call
//! performs exactly one round trip and reports a [`ProbeOutcome`]; failures
//! are outcomes, never errors.
//!
//! - [`IcmpProber`]: ICMP echo via raw/datagram sockets
//! - [`CommandProber`]: the system `ping` binary
//! - [`TcpProber`]: TCP connect handshake time

mod command;
mod icmp;
mod tcp;
mod traits;

pub use command::CommandProber;
pub use icmp::IcmpProber;
pub use tcp::TcpProber;
pub use traits::{ProbeFailure, ProbeOutcome, Prober, Target, TargetError};
