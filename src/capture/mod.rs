//! Interactive configuration capture
//!
//! Turns the scanner's host list and operator input into a confirmed
//! `CaptureOutcome`. The session threads explicit builder state through
//! every prompt; nothing is written to the secret store until the whole
//! session completes, so an abort at any prompt leaves the store
//! untouched.
//!
//! Network lookups go through the `Discovery` trait so tests can drive
//! the session against canned hosts and shares.

pub mod prompt;

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use tracing::{info, warn};

use crate::discovery;
use crate::error::{Result, SeedForgeError};
use crate::records::{validate_username, CaptureOutcome, Credentials, Host, PrimaryAccount, Share};
use crate::secrets::labels::{
    self, host_attr_label, host_label, share_attr_label, share_label,
};
use crate::secrets::store::{SecretStore, VaultField};
use crate::types::{ServiceKind, ShareKind};

use prompt::{confirm, input_optional, input_required, secret_required, select, Prompter};

/// Network lookups the capture session depends on.
pub trait Discovery {
    fn detect_services(&self, address: Ipv4Addr) -> BTreeSet<ServiceKind>;
    fn list_smb_shares(&self, host: &Host, credentials: Option<&Credentials>)
        -> Result<Vec<String>>;
    fn list_nfs_exports(&self, host: &Host) -> Result<Vec<String>>;
}

/// Production `Discovery` over the real network.
pub struct NetDiscovery;

impl Discovery for NetDiscovery {
    fn detect_services(&self, address: Ipv4Addr) -> BTreeSet<ServiceKind> {
        discovery::detect_services_at(address)
    }

    fn list_smb_shares(
        &self,
        host: &Host,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<String>> {
        discovery::list_smb_shares(host, credentials)
    }

    fn list_nfs_exports(&self, host: &Host) -> Result<Vec<String>> {
        discovery::list_nfs_exports(host)
    }
}

/// What the operator chose to do for one host slot.
enum ShareChoice {
    Smb,
    Nfs,
    Manual,
    None,
}

/// One interactive capture session.
pub struct CaptureSession<'a> {
    prompter: &'a mut dyn Prompter,
    discovery: &'a dyn Discovery,
    /// Scanner output, sorted by address, offered for selection.
    discovered: Vec<Host>,
}

impl<'a> CaptureSession<'a> {
    pub fn new(
        prompter: &'a mut dyn Prompter,
        discovery: &'a dyn Discovery,
        mut discovered: Vec<Host>,
    ) -> Self {
        discovered.sort_by_key(|h| h.address);
        Self {
            prompter,
            discovery,
            discovered,
        }
    }

    /// Run the full session: primary account, then `slots` host/share
    /// slots (prompted for when `None`). Returns the validated,
    /// immutable outcome; the caller decides whether to persist it.
    pub fn run(&mut self, slots: Option<usize>) -> Result<CaptureOutcome> {
        let primary = self.capture_primary()?;

        let slots = match slots {
            Some(n) => n,
            None => self.ask_slot_count()?,
        };

        let mut hosts: Vec<Host> = Vec::new();
        let mut shares: Vec<Share> = Vec::new();
        for ordinal in 1..=slots {
            self.prompter
                .say(&format!("\n--- Host {} of {} ---", ordinal, slots));
            let (host, share) = self.capture_slot()?;
            // Host identity is the address; re-selecting a host must not
            // duplicate it.
            if !hosts.iter().any(|h| h.address == host.address) {
                hosts.push(host);
            }
            if let Some(share) = share {
                shares.push(share);
            }
        }

        let outcome = CaptureOutcome {
            primary,
            hosts,
            shares,
        };
        outcome
            .validate()
            .map_err(|e| SeedForgeError::invalid(format!("{e:#}")))?;
        info!(
            "Capture complete: {} host(s), {} share(s)",
            outcome.hosts.len(),
            outcome.shares.len()
        );
        Ok(outcome)
    }

    fn capture_primary(&mut self) -> Result<PrimaryAccount> {
        self.prompter.say("Primary installer account");
        self.prompter.say("-------------------------");
        let username = loop {
            let candidate = input_required(self.prompter, "Username: ")?;
            match validate_username(&candidate) {
                Ok(()) => break candidate,
                Err(e) => self.prompter.say(&format!("{e:#}")),
            }
        };
        let user_password =
            secret_required(self.prompter, &format!("Password for {}: ", username))?;
        let root_password = secret_required(self.prompter, "Root password: ")?;
        let ssh_authorized_key = input_optional(
            self.prompter,
            "SSH public key to authorize (empty for none): ",
        )?;
        Ok(PrimaryAccount {
            username,
            user_password,
            root_password,
            ssh_authorized_key,
        })
    }

    fn ask_slot_count(&mut self) -> Result<usize> {
        loop {
            let raw = input_required(self.prompter, "How many network hosts to configure? ")?;
            match raw.parse::<usize>() {
                Ok(n) => return Ok(n),
                Err(_) => self.prompter.say("Enter a number."),
            }
        }
    }

    /// Capture one host and, optionally, one share on it.
    fn capture_slot(&mut self) -> Result<(Host, Option<Share>)> {
        let mut host = self.pick_host()?;
        host.services = self.discovery.detect_services(host.address);
        if host.services.is_empty() {
            self.prompter
                .say(&format!("No services detected on {}.", host));
        } else {
            let listing: Vec<String> = host.services.iter().map(|s| s.to_string()).collect();
            self.prompter
                .say(&format!("Detected on {}: {}", host, listing.join(", ")));
        }

        let share = match self.pick_share_kind(&host)? {
            ShareChoice::Smb => self.smb_flow(&host)?,
            ShareChoice::Nfs => self.nfs_flow(&host)?,
            ShareChoice::Manual => Some(self.manual_share(&host)?),
            ShareChoice::None => None,
        };
        Ok((host, share))
    }

    /// Offer the discovered list, or manual entry when it is empty or
    /// nothing matches.
    fn pick_host(&mut self) -> Result<Host> {
        if self.discovered.is_empty() {
            return self.manual_host();
        }
        let mut options: Vec<String> = self.discovered.iter().map(Host::to_string).collect();
        options.push("Enter a host manually".to_string());
        let choice = select(self.prompter, "Select a host:", &options)?;
        if choice == options.len() {
            self.manual_host()
        } else {
            Ok(self.discovered[choice - 1].clone())
        }
    }

    fn manual_host(&mut self) -> Result<Host> {
        let address = loop {
            let raw = input_required(self.prompter, "Host IPv4 address: ")?;
            match raw.parse::<Ipv4Addr>() {
                Ok(addr) => break addr,
                Err(_) => self
                    .prompter
                    .say(&format!("'{}' is not an IPv4 address.", raw)),
            }
        };
        let name = input_optional(self.prompter, "Hostname (empty to use the address): ")?
            .unwrap_or_else(|| address.to_string());
        Ok(Host {
            name,
            address,
            services: BTreeSet::new(),
        })
    }

    fn pick_share_kind(&mut self, host: &Host) -> Result<ShareChoice> {
        let mut options = Vec::new();
        let mut choices = Vec::new();
        if host.has_service(ServiceKind::Smb) {
            options.push(format!("Select an SMB share on {}", host.name));
            choices.push(ShareChoice::Smb);
        }
        if host.has_service(ServiceKind::Nfs) {
            options.push(format!("Select an NFS export on {}", host.name));
            choices.push(ShareChoice::Nfs);
        }
        options.push("Enter a share manually".to_string());
        choices.push(ShareChoice::Manual);
        options.push("No share for this host".to_string());
        choices.push(ShareChoice::None);

        let choice = select(self.prompter, "Configure storage:", &options)?;
        Ok(choices.swap_remove(choice - 1))
    }

    /// SMB selection: anonymous first; on failure request credentials and
    /// retry exactly once. A second failure degrades to manual entry (or
    /// no share); it never loops.
    fn smb_flow(&mut self, host: &Host) -> Result<Option<Share>> {
        match self.discovery.list_smb_shares(host, None) {
            Ok(shares) if !shares.is_empty() => {
                let path = self.pick_from(&shares, &format!("SMB shares on {}:", host.name))?;
                return Ok(Some(Share {
                    host: host.address,
                    host_name: host.name.clone(),
                    path,
                    kind: ShareKind::Smb,
                    username: None,
                    password: None,
                }));
            }
            Ok(_) => self
                .prompter
                .say("No shares visible anonymously; credentials may be required."),
            Err(e) if matches!(e, SeedForgeError::Unsupported(_)) => {
                self.prompter.say(&format!("{e}"));
                return self.degrade_to_manual(host);
            }
            Err(e) => {
                warn!("Anonymous SMB listing on {} failed: {}", host, e);
                self.prompter
                    .say(&format!("Anonymous listing failed: {e}"));
            }
        }

        // One credentialed retry.
        let username = input_required(self.prompter, "Share username: ")?;
        let password = secret_required(self.prompter, "Share password: ")?;
        let credentials = Credentials {
            username: username.clone(),
            password: password.clone(),
        };
        match self.discovery.list_smb_shares(host, Some(&credentials)) {
            Ok(shares) if !shares.is_empty() => {
                let path = self.pick_from(&shares, &format!("SMB shares on {}:", host.name))?;
                Ok(Some(Share {
                    host: host.address,
                    host_name: host.name.clone(),
                    path,
                    kind: ShareKind::Smb,
                    username: Some(username),
                    password: Some(password),
                }))
            }
            Ok(_) => {
                self.prompter
                    .say("Still no shares visible with credentials.");
                self.degrade_to_manual(host)
            }
            Err(e) => {
                warn!("Credentialed SMB listing on {} failed: {}", host, e);
                self.prompter.say(&format!("Listing failed: {e}"));
                self.degrade_to_manual(host)
            }
        }
    }

    fn nfs_flow(&mut self, host: &Host) -> Result<Option<Share>> {
        match self.discovery.list_nfs_exports(host) {
            Ok(exports) if !exports.is_empty() => {
                let path = self.pick_from(&exports, &format!("NFS exports on {}:", host.name))?;
                Ok(Some(Share {
                    host: host.address,
                    host_name: host.name.clone(),
                    path,
                    kind: ShareKind::Nfs,
                    username: None,
                    password: None,
                }))
            }
            Ok(_) => {
                self.prompter.say("The host publishes no exports.");
                self.degrade_to_manual(host)
            }
            Err(e) => {
                warn!("NFS export listing on {} failed: {}", host, e);
                self.prompter.say(&format!("{e}"));
                self.degrade_to_manual(host)
            }
        }
    }

    fn degrade_to_manual(&mut self, host: &Host) -> Result<Option<Share>> {
        if confirm(self.prompter, "Enter the share manually instead?", true)? {
            Ok(Some(self.manual_share(host)?))
        } else {
            Ok(None)
        }
    }

    fn manual_share(&mut self, host: &Host) -> Result<Share> {
        let path = input_required(self.prompter, "Share name or export path: ")?;
        let username = input_optional(
            self.prompter,
            "Share username (empty to reuse the primary account): ",
        )?;
        let password = match &username {
            Some(_) => Some(secret_required(self.prompter, "Share password: ")?),
            None => None,
        };
        Ok(Share {
            host: host.address,
            host_name: host.name.clone(),
            path,
            kind: ShareKind::Manual,
            username,
            password,
        })
    }

    fn pick_from(&mut self, items: &[String], title: &str) -> Result<String> {
        let idx = select(self.prompter, title, items)?;
        Ok(items[idx - 1].clone())
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Write a completed outcome to the store as the three logical items.
///
/// Called only after `CaptureSession::run` returns; each item write is one
/// logical unit, and a failure surfaces without retrying a different
/// field set.
pub fn persist_outcome(
    store: &mut dyn SecretStore,
    vault: &str,
    outcome: &CaptureOutcome,
) -> Result<()> {
    store.ensure_vault(vault)?;
    store.upsert_item(labels::PRIMARY_ITEM, vault, &primary_fields(&outcome.primary))?;
    store.upsert_item(labels::HOSTS_ITEM, vault, &host_fields(&outcome.hosts))?;
    store.upsert_item(labels::SHARES_ITEM, vault, &share_fields(&outcome.shares))?;
    info!("Persisted capture to vault '{}'", vault);
    Ok(())
}

fn primary_fields(primary: &PrimaryAccount) -> Vec<VaultField> {
    let mut fields = vec![
        VaultField::username(labels::USERNAME.canonical, primary.username.as_str()),
        VaultField::password(labels::USER_PASSWORD.canonical, primary.user_password.as_str()),
        VaultField::password(labels::ROOT_PASSWORD.canonical, primary.root_password.as_str()),
    ];
    if let Some(key) = &primary.ssh_authorized_key {
        fields.push(VaultField::text(labels::SSH_AUTHORIZED_KEY.canonical, key.as_str()));
    }
    fields
}

fn host_fields(hosts: &[Host]) -> Vec<VaultField> {
    let mut fields = vec![VaultField::text(
        labels::HOST_COUNT.canonical,
        hosts.len().to_string(),
    )];
    for (idx, host) in hosts.iter().enumerate() {
        let ordinal = idx + 1;
        fields.push(VaultField::text(
            host_label(ordinal),
            host.address.to_string(),
        ));
        fields.push(VaultField::text(
            host_attr_label(ordinal, "name"),
            host.name.as_str(),
        ));
    }
    fields
}

fn share_fields(shares: &[Share]) -> Vec<VaultField> {
    let mut fields = vec![VaultField::text(
        labels::SHARE_COUNT.canonical,
        shares.len().to_string(),
    )];
    for (idx, share) in shares.iter().enumerate() {
        let ordinal = idx + 1;
        fields.push(VaultField::text(share_label(ordinal), share.path.as_str()));
        fields.push(VaultField::text(
            share_attr_label(ordinal, "host"),
            share.host.to_string(),
        ));
        fields.push(VaultField::text(
            share_attr_label(ordinal, "kind"),
            share.kind.to_string(),
        ));
        if let Some(username) = &share.username {
            fields.push(VaultField::text(
                share_attr_label(ordinal, "username"),
                username.as_str(),
            ));
        }
        if let Some(password) = &share.password {
            fields.push(VaultField::password(
                share_attr_label(ordinal, "password"),
                password.as_str(),
            ));
        }
    }
    fields
}
