//! Service detection on discovered hosts
//!
//! Pure Rust probing: each candidate service gets a short
//! `TcpStream::connect_timeout` attempt against its well-known ports.
//! An unreachable port is a normal empty outcome and never delays or
//! fails detection of the other services.

// Library API - the record-based entry point is consumed by diagnostics
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::records::Host;
use crate::types::ServiceKind;

/// Per-port connect timeout. Long enough for a LAN host under load,
/// short enough that probing a dead port set stays interactive.
const PROBE_TIMEOUT: Duration = Duration::from_millis(400);

/// Probe every candidate service on `host` and return the union of
/// successful probes. Default empty set; never fails.
pub fn detect_services(host: &Host) -> BTreeSet<ServiceKind> {
    detect_services_at(host.address)
}

/// Probe by raw address (used before a `Host` record exists, e.g. for
/// operator-entered hosts).
pub fn detect_services_at(address: Ipv4Addr) -> BTreeSet<ServiceKind> {
    let mut detected = BTreeSet::new();
    for kind in ServiceKind::iter() {
        if kind
            .ports()
            .iter()
            .any(|&port| port_open(address, port, PROBE_TIMEOUT))
        {
            detected.insert(kind);
        }
    }
    debug!("Service probe for {}: {:?}", address, detected);
    detected
}

/// Single bounded TCP connect attempt.
fn port_open(address: Ipv4Addr, port: u16, timeout: Duration) -> bool {
    let addr = SocketAddr::from((address, port));
    TcpStream::connect_timeout(&addr, timeout).is_ok()
}
