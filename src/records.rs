//! Capture-time record types
//!
//! These records exist for the duration of one capture session: the scanner
//! produces `Host`s, the capture session refines them and attaches `Share`s,
//! and the whole outcome is written to the secret store as three logical
//! items. The secret store is the durable form; nothing here is cached
//! between runs.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;

use crate::types::{ServiceKind, ShareKind};

/// A username/password pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A discovered or operator-entered network host.
///
/// Identity is the address; `name` falls back to the address text when no
/// reverse name resolves. Immutable once the capture session confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    pub address: Ipv4Addr,
    #[serde(default)]
    pub services: BTreeSet<ServiceKind>,
}

impl Host {
    /// Create a host whose name is its own address text.
    pub fn unnamed(address: Ipv4Addr) -> Self {
        Self {
            name: address.to_string(),
            address,
            services: BTreeSet::new(),
        }
    }

    pub fn has_service(&self, kind: ServiceKind) -> bool {
        self.services.contains(&kind)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.address.to_string() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.name, self.address)
        }
    }
}

/// A shared resource confirmed by the operator during capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Address of the owning host (host identity).
    pub host: Ipv4Addr,
    /// Hostname of the owning host at capture time.
    pub host_name: String,
    /// Share name or export path as the server publishes it.
    pub path: String,
    pub kind: ShareKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Share {
    /// Credentials to mount this share with.
    ///
    /// When a credential-requiring share carries none of its own, the
    /// primary installer account's pair is reused. This is a convenience
    /// default inherited from the original workflow; NFS exports mount
    /// without credentials and always yield `None`.
    pub fn effective_credentials(&self, primary: &Credentials) -> Option<Credentials> {
        if !self.kind.requires_credentials() {
            return None;
        }
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some(Credentials {
                username: u.clone(),
                password: p.clone(),
            }),
            _ => Some(primary.clone()),
        }
    }

    /// Validate the share invariant: a credential-requiring kind never ends
    /// up with an empty effective pair.
    pub fn validate(&self, primary: &Credentials) -> Result<()> {
        if self.path.trim().is_empty() {
            bail!("Share on {} has an empty path", self.host);
        }
        if let Some(creds) = self.effective_credentials(primary) {
            if creds.username.trim().is_empty() || creds.password.trim().is_empty() {
                bail!(
                    "{} share '{}' requires credentials but none are available",
                    self.kind,
                    self.path
                );
            }
        }
        Ok(())
    }
}

/// The primary installer account captured at the start of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryAccount {
    pub username: String,
    pub user_password: String,
    pub root_password: String,
    /// Optional SSH public key installed for the primary account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_authorized_key: Option<String>,
}

impl PrimaryAccount {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.user_password.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        if self.user_password.is_empty() || self.root_password.is_empty() {
            bail!("User and root passwords must not be empty");
        }
        Ok(())
    }
}

/// Validate a Unix account name the way the installer will.
pub fn validate_username(username: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    if !username.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
        bail!("Username must start with a lowercase letter");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        bail!("Username may only contain lowercase letters, digits, '_' and '-'");
    }
    Ok(())
}

/// Immutable result of a completed capture session.
///
/// Hosts and shares keep their capture order; their 1-based position is the
/// ordinal used later as the template index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureOutcome {
    pub primary: PrimaryAccount,
    pub hosts: Vec<Host>,
    pub shares: Vec<Share>,
}

impl CaptureOutcome {
    /// Validate every record before anything is written to the store.
    pub fn validate(&self) -> Result<()> {
        self.primary.validate()?;
        let primary = self.primary.credentials();
        for share in &self.shares {
            share.validate(&primary)?;
            if !self.hosts.iter().any(|h| h.address == share.host) {
                bail!(
                    "Share '{}' references unknown host {}",
                    share.path,
                    share.host
                );
            }
        }
        Ok(())
    }
}
