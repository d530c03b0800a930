//! Local subnet detection
//!
//! Asks iproute2 for the interface table (`ip -j -4 addr show`) and picks
//! the first non-loopback interface carrying an IPv4 address. For the
//! common /24 LAN case the subnet is normalized to `a.b.c.0/24`; any other
//! prefix is kept verbatim rather than attempting general CIDR arithmetic,
//! which would over- or under-scan unusual topologies.

use serde::Deserialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Result, SeedForgeError};
use crate::runner::run_command;

/// A scan target in CIDR form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    /// Network base for /24, otherwise the interface address as reported.
    pub base: Ipv4Addr,
    pub prefix: u8,
}

impl Subnet {
    /// Build the scan target for an interface address.
    ///
    /// A /24 prefix keeps the confirmed three octets and zeroes the host
    /// octet; everything else passes through unchanged.
    pub fn from_interface(address: Ipv4Addr, prefix: u8) -> Self {
        let base = if prefix == 24 {
            let [a, b, c, _] = address.octets();
            Ipv4Addr::new(a, b, c, 0)
        } else {
            address
        };
        Self { base, prefix }
    }

    /// Addresses `.1`–`.254` of this subnet's /24, for the ping-sweep
    /// fallback strategy.
    pub fn sweep_addresses(&self) -> impl Iterator<Item = Ipv4Addr> {
        let [a, b, c, _] = self.base.octets();
        (1u8..=254).map(move |d| Ipv4Addr::new(a, b, c, d))
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix)
    }
}

impl FromStr for Subnet {
    type Err = SeedForgeError;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| SeedForgeError::invalid(format!("'{}' is not CIDR notation", s)))?;
        let address: Ipv4Addr = addr
            .parse()
            .map_err(|_| SeedForgeError::invalid(format!("'{}' is not an IPv4 address", addr)))?;
        let prefix: u8 = prefix
            .parse()
            .ok()
            .filter(|p| *p <= 32)
            .ok_or_else(|| SeedForgeError::invalid(format!("'{}' is not a valid prefix", prefix)))?;
        Ok(Self::from_interface(address, prefix))
    }
}

// iproute2 JSON shapes (only the fields we read)

#[derive(Debug, Deserialize)]
struct IpInterface {
    ifname: String,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    addr_info: Vec<AddrInfo>,
}

#[derive(Debug, Deserialize)]
struct AddrInfo {
    #[serde(default)]
    family: String,
    local: Option<String>,
    prefixlen: Option<u8>,
}

/// Detect the local subnet to scan.
///
/// Returns `Unreachable` when no non-loopback interface carries an IPv4
/// address (typical on a host whose network is not up yet).
pub fn detect_local_subnet() -> Result<Subnet> {
    let output = run_command("ip", &["-j", "-4", "addr", "show"])
        .map_err(|e| SeedForgeError::unsupported(format!("iproute2 unavailable: {e:#}")))?;
    if !output.success {
        return Err(SeedForgeError::unreachable("'ip addr' query failed"));
    }
    subnet_from_ip_json(&output.stdout)
}

fn subnet_from_ip_json(json: &str) -> Result<Subnet> {
    let interfaces: Vec<IpInterface> = serde_json::from_str(json)?;

    for iface in &interfaces {
        if iface.ifname == "lo" || iface.flags.iter().any(|f| f == "LOOPBACK") {
            continue;
        }
        for info in &iface.addr_info {
            if info.family != "inet" {
                continue;
            }
            let (Some(local), Some(prefix)) = (&info.local, info.prefixlen) else {
                continue;
            };
            let Ok(address) = local.parse::<Ipv4Addr>() else {
                continue;
            };
            if address.is_loopback() {
                continue;
            }
            let subnet = Subnet::from_interface(address, prefix);
            debug!(
                "Selected interface {} ({}/{}) -> subnet {}",
                iface.ifname, address, prefix, subnet
            );
            return Ok(subnet);
        }
    }

    Err(SeedForgeError::unreachable(
        "no non-loopback interface with an IPv4 address",
    ))
}
