//! Host discovery over the local subnet
//!
//! Two strategies produce the same `Host` record shape, so callers never
//! care which one ran:
//!
//! 1. `nmap -sn` over the CIDR (preferred: one pass, resolves names)
//! 2. Sequential `ping` of `.1`–`.254` with best-effort `getent hosts`
//!    reverse lookup (fallback when nmap is not installed)
//!
//! Zero live hosts is a valid, reportable outcome, not a failure.

use std::net::Ipv4Addr;
use tracing::{debug, info};

use crate::discovery::subnet::Subnet;
use crate::error::{Result, SeedForgeError};
use crate::records::Host;
use crate::runner::{binary_exists, run_command};

/// Scan the subnet for live hosts, sorted by address.
pub fn scan_subnet(subnet: &Subnet) -> Result<Vec<Host>> {
    let mut hosts = if binary_exists("nmap") {
        nmap_scan(subnet)?
    } else {
        info!("nmap not found, falling back to ping sweep of {}", subnet);
        ping_sweep(subnet)?
    };
    hosts.sort_by_key(|h| h.address);
    hosts.dedup_by_key(|h| h.address);
    info!("Discovered {} host(s) on {}", hosts.len(), subnet);
    Ok(hosts)
}

fn nmap_scan(subnet: &Subnet) -> Result<Vec<Host>> {
    let target = subnet.to_string();
    let output = run_command("nmap", &["-sn", &target])
        .map_err(|e| SeedForgeError::unsupported(format!("nmap unavailable: {e:#}")))?;
    if !output.success {
        return Err(SeedForgeError::unreachable(format!(
            "nmap scan of {} failed: {}",
            target,
            output.stderr.trim()
        )));
    }
    Ok(parse_nmap_reports(&output.stdout))
}

/// Parse `Nmap scan report for ...` lines.
///
/// Two forms appear: `for name (1.2.3.4)` when a reverse name resolved and
/// `for 1.2.3.4` when it did not.
fn parse_nmap_reports(stdout: &str) -> Vec<Host> {
    let mut hosts = Vec::new();
    for line in stdout.lines() {
        let Some(rest) = line.trim().strip_prefix("Nmap scan report for ") else {
            continue;
        };
        let host = if let Some((name, addr)) = rest.rsplit_once(" (") {
            let addr = addr.trim_end_matches(')');
            match addr.parse::<Ipv4Addr>() {
                Ok(address) => Host {
                    name: name.trim().to_string(),
                    address,
                    services: Default::default(),
                },
                Err(_) => continue,
            }
        } else {
            match rest.trim().parse::<Ipv4Addr>() {
                Ok(address) => Host::unnamed(address),
                Err(_) => continue,
            }
        };
        debug!("nmap: live host {}", host);
        hosts.push(host);
    }
    hosts
}

fn ping_sweep(subnet: &Subnet) -> Result<Vec<Host>> {
    if !binary_exists("ping") {
        return Err(SeedForgeError::unsupported(
            "neither nmap nor ping is available for host discovery",
        ));
    }
    let can_resolve = binary_exists("getent");
    let mut hosts = Vec::new();
    for address in subnet.sweep_addresses() {
        let addr_text = address.to_string();
        let reply = run_command("ping", &["-c", "1", "-W", "1", &addr_text])
            .map(|out| out.success)
            .unwrap_or(false);
        if !reply {
            continue;
        }
        let name = if can_resolve {
            reverse_lookup(address).unwrap_or_else(|| addr_text.clone())
        } else {
            addr_text.clone()
        };
        debug!("ping sweep: live host {} ({})", name, address);
        hosts.push(Host {
            name,
            address,
            services: Default::default(),
        });
    }
    Ok(hosts)
}

/// Best-effort reverse name lookup via the system resolver.
fn reverse_lookup(address: Ipv4Addr) -> Option<String> {
    let output = run_command("getent", &["hosts", &address.to_string()]).ok()?;
    if !output.success {
        return None;
    }
    let line = output.stdout_lines().next()?;
    let name = line.split_whitespace().nth(1)?;
    Some(name.trim_end_matches('.').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nmap_report_with_name() {
        let stdout = "Starting Nmap\nNmap scan report for nas.lan (10.0.0.7)\nHost is up.\n";
        let hosts = parse_nmap_reports(stdout);
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "nas.lan");
        assert_eq!(hosts[0].address, Ipv4Addr::new(10, 0, 0, 7));
    }

    #[test]
    fn test_parse_nmap_report_without_name() {
        let stdout = "Nmap scan report for 10.0.0.9\nHost is up (0.0010s latency).\n";
        let hosts = parse_nmap_reports(stdout);
        assert_eq!(hosts.len(), 1);
        // The address doubles as the name when nothing resolves.
        assert_eq!(hosts[0].name, "10.0.0.9");
    }

    #[test]
    fn test_parse_nmap_skips_non_ipv4_reports() {
        let stdout = "Nmap scan report for router (fe80::1)\n";
        assert!(parse_nmap_reports(stdout).is_empty());
    }

    #[test]
    fn test_empty_scan_output_yields_empty_list() {
        // Zero reachable hosts is success, not failure.
        assert!(parse_nmap_reports("Starting Nmap 7.94\nNmap done.\n").is_empty());
    }

    #[test]
    fn test_both_strategies_share_record_shape() {
        let named = parse_nmap_reports("Nmap scan report for nas (10.0.0.7)\n");
        let host = Host::unnamed(Ipv4Addr::new(10, 0, 0, 7));
        assert_eq!(named[0].address, host.address);
        assert!(named[0].services.is_empty() && host.services.is_empty());
    }
}
