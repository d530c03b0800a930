//! Share enumeration on a single host
//!
//! Wraps `smbclient -L` and `showmount -e`. A missing tool is
//! `Unsupported` (non-retryable; degrade to manual entry); a failed or
//! denied query is `Unreachable` (the capture session may retry an SMB
//! query exactly once with credentials). The enumerator itself never
//! prompts and never retries.

use tracing::debug;

use crate::error::{Result, SeedForgeError};
use crate::records::{Credentials, Host};
use crate::runner::{binary_exists, run_command};

/// List SMB disk shares exposed by `host`.
///
/// Anonymous when `credentials` is `None` (`-N`); authenticated otherwise.
/// Administrative shares (`IPC$`, `ADMIN$`, ...) are filtered out.
pub fn list_smb_shares(host: &Host, credentials: Option<&Credentials>) -> Result<Vec<String>> {
    if !binary_exists("smbclient") {
        return Err(SeedForgeError::unsupported(
            "smbclient is not installed; enter the share manually",
        ));
    }

    let service = format!("//{}", host.address);
    let auth = credentials.map(|c| format!("{}%{}", c.username, c.password));
    let mut args: Vec<&str> = vec!["-L", &service, "-g"];
    match &auth {
        Some(pair) => {
            args.push("-U");
            args.push(pair);
        }
        None => args.push("-N"),
    }

    let output = run_command("smbclient", &args)
        .map_err(|e| SeedForgeError::unsupported(format!("smbclient unavailable: {e:#}")))?;
    let shares = parse_smbclient_grepable(&output.stdout);

    // smbclient exits non-zero both for unreachable hosts and for denied
    // anonymous listings; either way the caller sees `Unreachable` and may
    // retry once with credentials.
    if !output.success && shares.is_empty() {
        return Err(SeedForgeError::unreachable(format!(
            "SMB listing on {} failed: {}",
            host,
            first_error_line(&output.stderr)
        )));
    }

    debug!("{} SMB share(s) on {}", shares.len(), host);
    Ok(shares)
}

/// List NFS exports published by `host`.
pub fn list_nfs_exports(host: &Host) -> Result<Vec<String>> {
    if !binary_exists("showmount") {
        return Err(SeedForgeError::unsupported(
            "showmount is not installed; enter the export manually",
        ));
    }

    let target = host.address.to_string();
    let output = run_command("showmount", &["-e", "--no-headers", &target])
        .map_err(|e| SeedForgeError::unsupported(format!("showmount unavailable: {e:#}")))?;
    if !output.success {
        return Err(SeedForgeError::unreachable(format!(
            "NFS export listing on {} failed: {}",
            host,
            first_error_line(&output.stderr)
        )));
    }

    let exports: Vec<String> = output
        .stdout_lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect();
    debug!("{} NFS export(s) on {}", exports.len(), host);
    Ok(exports)
}

/// Parse `smbclient -g` (grepable) output: `type|name|comment` lines.
fn parse_smbclient_grepable(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.trim().splitn(3, '|');
            match (parts.next(), parts.next()) {
                (Some("Disk"), Some(name)) if !name.ends_with('$') => Some(name.to_string()),
                _ => None,
            }
        })
        .collect()
}

fn first_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no error output")
        .to_string()
}
