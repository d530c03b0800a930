//! Pre-flight checks for the runtime environment
//!
//! Verifies the external tools a subcommand depends on before any
//! interactive work starts, so the operator gets one clear report instead
//! of a mid-session failure. Optional tools only degrade a strategy
//! (nmap → ping sweep, smbclient/showmount → manual entry) and are
//! reported as warnings.

use crate::runner::binary_exists;

/// Tools a command cannot run without, as (command, providing package).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("ip", "iproute2"), // interface/subnet detection
    ("op", "1password-cli"), // secret store access
];

/// Tools whose absence only disables a fallback or enumeration strategy.
pub const OPTIONAL_TOOLS: &[(&str, &str)] = &[
    ("nmap", "nmap"),
    ("ping", "iputils-ping"),
    ("getent", "libc-bin"),
    ("smbclient", "smbclient"),
    ("showmount", "nfs-common"),
];

/// Result of environment verification
#[derive(Debug, Default)]
pub struct SanityCheckResult {
    pub missing_required: Vec<&'static str>,
    pub missing_optional: Vec<&'static str>,
}

impl SanityCheckResult {
    /// Returns true if the command can run at all.
    pub fn is_ok(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Check the environment for a command needing the given required subset.
///
/// `needed` filters `REQUIRED_TOOLS`: `build` has no use for iproute2,
/// `scan` has none for the secret store CLI.
pub fn verify_environment(needed: &[&str]) -> SanityCheckResult {
    let mut result = SanityCheckResult::default();
    for &(binary, _) in REQUIRED_TOOLS {
        if needed.contains(&binary) && !binary_exists(binary) {
            result.missing_required.push(binary);
        }
    }
    for &(binary, _) in OPTIONAL_TOOLS {
        if !binary_exists(binary) {
            result.missing_optional.push(binary);
        }
    }
    result
}

/// Package that provides a tool, for the failure report.
pub fn providing_package(binary: &str) -> &'static str {
    REQUIRED_TOOLS
        .iter()
        .chain(OPTIONAL_TOOLS)
        .find(|(name, _)| *name == binary)
        .map(|(_, pkg)| *pkg)
        .unwrap_or("unknown")
}
