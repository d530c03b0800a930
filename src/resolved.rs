//! Build-time resolved configuration
//!
//! `ResolvedConfig` is the flat mapping of logical keys to concrete values
//! that the template substitutor consumes, plus the two indexed
//! collections (hosts, shares) with their 1-based ordinals. It is built
//! once per build run from the three store items and never mutated after
//! substitution begins; nothing is cached across runs.
//!
//! # Resolution Rules
//!
//! | Logical value              | On failure |
//! |----------------------------|------------|
//! | username, both passwords   | fatal, abort before any artifact |
//! | SSH authorized key         | default: empty |
//! | a share's credential pair  | default: primary account pair |
//! | shares/hosts items missing | default: empty collections |
//!
//! A `Placeholder` failure is fatal everywhere, including for optional
//! values: a concealed field means the session cannot reveal secrets and
//! the operator has to fix that, not ship a redaction literal.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{Result, SeedForgeError};
use crate::secrets::labels::{
    self, host_attr_alternate, host_attr_label, host_label, share_attr_alternate,
    share_attr_label, share_label,
};
use crate::secrets::resolver::{resolve, resolve_spec};
use crate::secrets::store::VaultItem;
use crate::types::ShareKind;

// ============================================================================
// Template key builders
// ============================================================================
//
// Indexed template keys are always produced by these functions; the
// renderer and the env generator never assemble key strings ad hoc.

/// Key of the Nth share's path: `share1`.
pub fn share_key(ordinal: usize) -> String {
    format!("share{}", ordinal)
}

/// Key of the Nth share's attribute: `share1_username`.
pub fn share_field_key(ordinal: usize, attr: &str) -> String {
    format!("share{}_{}", ordinal, attr)
}

/// Key of the Nth host's address: `host1`.
pub fn host_key(ordinal: usize) -> String {
    format!("host{}", ordinal)
}

/// Key of the Nth host's attribute: `host1_name`.
pub fn host_field_key(ordinal: usize, attr: &str) -> String {
    format!("host{}_{}", ordinal, attr)
}

// ============================================================================
// Resolved collections
// ============================================================================

/// One host, resolved for substitution. `ordinal` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHost {
    pub ordinal: usize,
    pub address: String,
    pub name: String,
}

/// One share, resolved for substitution, credentials already defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShare {
    pub ordinal: usize,
    pub host: String,
    pub path: String,
    pub kind: ShareKind,
    pub username: String,
    pub password: String,
}

/// The final flat mapping handed to the template substitutor.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    values: BTreeMap<String, String>,
    pub hosts: Vec<ResolvedHost>,
    pub shares: Vec<ResolvedShare>,
}

impl ResolvedConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// All key/value pairs, sorted by key.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Assemble the config from the store items of one build run.
    ///
    /// `primary` is mandatory; the shares and hosts items may be absent
    /// (a capture that configured no network storage), which yields empty
    /// collections. Fatal resolution failures propagate before the caller
    /// writes any artifact.
    pub fn from_items(
        primary: &VaultItem,
        shares: Option<&VaultItem>,
        hosts: Option<&VaultItem>,
    ) -> Result<Self> {
        let mut values = BTreeMap::new();

        // Required: the build cannot proceed without these.
        let username = resolve_spec(primary, &labels::USERNAME)?;
        let user_password = resolve_spec(primary, &labels::USER_PASSWORD)?;
        let root_password = resolve_spec(primary, &labels::ROOT_PASSWORD)?;

        // Optional: degrades to the documented default.
        let ssh_key = match resolve_spec(primary, &labels::SSH_AUTHORIZED_KEY) {
            Ok(value) => value,
            Err(SeedForgeError::NotFound(_)) => {
                debug!("No SSH authorized key in '{}', defaulting to empty", primary.title);
                String::new()
            }
            Err(e) => return Err(e),
        };

        values.insert("username".to_string(), username.clone());
        values.insert("user_password".to_string(), user_password.clone());
        values.insert("root_password".to_string(), root_password);
        values.insert("ssh_authorized_key".to_string(), ssh_key);

        let hosts = match hosts {
            Some(item) => resolve_hosts(item)?,
            None => {
                warn!("No discovered-hosts item; continuing with zero hosts");
                Vec::new()
            }
        };
        let shares = match shares {
            Some(item) => resolve_shares(item, &username, &user_password)?,
            None => {
                warn!("No discovered-shares item; continuing with zero shares");
                Vec::new()
            }
        };

        values.insert("host_count".to_string(), hosts.len().to_string());
        values.insert("share_count".to_string(), shares.len().to_string());

        for host in &hosts {
            values.insert(host_key(host.ordinal), host.address.clone());
            values.insert(host_field_key(host.ordinal, "name"), host.name.clone());
        }
        for share in &shares {
            values.insert(share_key(share.ordinal), share.path.clone());
            values.insert(share_field_key(share.ordinal, "host"), share.host.clone());
            values.insert(
                share_field_key(share.ordinal, "kind"),
                share.kind.to_string(),
            );
            values.insert(
                share_field_key(share.ordinal, "username"),
                share.username.clone(),
            );
            values.insert(
                share_field_key(share.ordinal, "password"),
                share.password.clone(),
            );
        }

        debug!(
            "Resolved config: {} scalar keys, {} host(s), {} share(s)",
            values.len(),
            hosts.len(),
            shares.len()
        );

        Ok(Self {
            values,
            hosts,
            shares,
        })
    }
}

fn resolve_count(item: &VaultItem, spec: &labels::LabelSpec) -> Result<usize> {
    let raw = match resolve_spec(item, spec) {
        Ok(value) => value,
        Err(SeedForgeError::NotFound(_)) => return Ok(0),
        Err(e) => return Err(e),
    };
    raw.trim().parse().map_err(|_| {
        SeedForgeError::invalid(format!(
            "field '{}' in item '{}' is not a count: '{}'",
            spec.canonical, item.title, raw
        ))
    })
}

fn resolve_hosts(item: &VaultItem) -> Result<Vec<ResolvedHost>> {
    let count = resolve_count(item, &labels::HOST_COUNT)?;
    let mut hosts = Vec::with_capacity(count);
    for ordinal in 1..=count {
        let address = resolve(item, &host_label(ordinal), &[], None)?;
        let name_label = host_attr_label(ordinal, "name");
        let name_alt = host_attr_alternate(ordinal, "name");
        let name = match resolve(item, &name_label, &[name_alt.as_str()], None) {
            Ok(value) => value,
            Err(SeedForgeError::NotFound(_)) => address.clone(),
            Err(e) => return Err(e),
        };
        hosts.push(ResolvedHost {
            ordinal,
            address,
            name,
        });
    }
    Ok(hosts)
}

fn resolve_shares(
    item: &VaultItem,
    primary_username: &str,
    primary_password: &str,
) -> Result<Vec<ResolvedShare>> {
    let count = resolve_count(item, &labels::SHARE_COUNT)?;
    let mut shares = Vec::with_capacity(count);
    for ordinal in 1..=count {
        let path_alt = share_attr_alternate(ordinal, "path");
        let path = resolve(item, &share_label(ordinal), &[path_alt.as_str()], None)?;

        let attr = |name: &str| -> Result<Option<String>> {
            let label = share_attr_label(ordinal, name);
            let alternate = share_attr_alternate(ordinal, name);
            match resolve(item, &label, &[alternate.as_str()], None) {
                Ok(value) => Ok(Some(value)),
                Err(SeedForgeError::NotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        };

        let host = attr("host")?.ok_or_else(|| {
            SeedForgeError::not_found(format!(
                "field '{}' in item '{}'",
                share_attr_label(ordinal, "host"),
                item.title
            ))
        })?;
        let kind = match attr("kind")? {
            Some(raw) => raw.parse::<ShareKind>().map_err(|_| {
                SeedForgeError::invalid(format!("unknown share kind '{}' for share {}", raw, ordinal))
            })?,
            None => ShareKind::Manual,
        };

        // Convenience default inherited from the original workflow: a
        // credential-requiring share without its own pair mounts with the
        // primary installer account's credentials.
        let (username, password) = if kind.requires_credentials() {
            match (attr("username")?, attr("password")?) {
                (Some(u), Some(p)) => (u, p),
                _ => (primary_username.to_string(), primary_password.to_string()),
            }
        } else {
            (String::new(), String::new())
        };

        shares.push(ResolvedShare {
            ordinal,
            host,
            path,
            kind,
            username,
            password,
        });
    }
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::store::VaultField;

    fn primary_item() -> VaultItem {
        VaultItem {
            title: labels::PRIMARY_ITEM.to_string(),
            vault: "homelab".to_string(),
            fields: vec![
                VaultField::username("username", "alice"),
                VaultField::password("password", "hunter2"),
                VaultField::password("root password", "toor"),
            ],
        }
    }

    fn shares_item() -> VaultItem {
        VaultItem {
            title: labels::SHARES_ITEM.to_string(),
            vault: "homelab".to_string(),
            fields: vec![
                VaultField::text("share count", "2"),
                VaultField::text("share1", "media"),
                VaultField::text("share1 host", "10.0.0.7"),
                VaultField::text("share1 kind", "smb"),
                VaultField::text("share1 username", "svc"),
                VaultField::text("share1 password", "svc-pw"),
                VaultField::text("share2", "/export/backups"),
                VaultField::text("share2 host", "10.0.0.8"),
                VaultField::text("share2 kind", "nfs"),
            ],
        }
    }

    fn hosts_item() -> VaultItem {
        VaultItem {
            title: labels::HOSTS_ITEM.to_string(),
            vault: "homelab".to_string(),
            fields: vec![
                VaultField::text("host count", "1"),
                VaultField::text("host1", "10.0.0.7"),
                VaultField::text("host1 name", "nas"),
            ],
        }
    }

    #[test]
    fn test_required_values_resolve() {
        let cfg =
            ResolvedConfig::from_items(&primary_item(), Some(&shares_item()), Some(&hosts_item()))
                .unwrap();
        assert_eq!(cfg.get("username"), Some("alice"));
        assert_eq!(cfg.get("root_password"), Some("toor"));
        assert_eq!(cfg.get("share_count"), Some("2"));
        assert_eq!(cfg.get("host_count"), Some("1"));
    }

    #[test]
    fn test_missing_root_password_is_fatal() {
        let mut item = primary_item();
        item.fields.retain(|f| f.label != "root password");
        let err = ResolvedConfig::from_items(&item, None, None).unwrap_err();
        assert!(matches!(err, SeedForgeError::NotFound(_)));
    }

    #[test]
    fn test_missing_ssh_key_defaults_to_empty() {
        let cfg = ResolvedConfig::from_items(&primary_item(), None, None).unwrap();
        assert_eq!(cfg.get("ssh_authorized_key"), Some(""));
    }

    #[test]
    fn test_concealed_ssh_key_is_still_fatal() {
        let mut item = primary_item();
        item.fields
            .push(VaultField::text("ssh public key", "CONCEALED"));
        let err = ResolvedConfig::from_items(&item, None, None).unwrap_err();
        assert!(matches!(err, SeedForgeError::Placeholder(_)));
    }

    #[test]
    fn test_indexed_share_keys() {
        let cfg =
            ResolvedConfig::from_items(&primary_item(), Some(&shares_item()), Some(&hosts_item()))
                .unwrap();
        assert_eq!(cfg.get("share1"), Some("media"));
        assert_eq!(cfg.get("share1_host"), Some("10.0.0.7"));
        assert_eq!(cfg.get("share1_username"), Some("svc"));
        assert_eq!(cfg.get("share2"), Some("/export/backups"));
        assert_eq!(cfg.get("host1_name"), Some("nas"));
    }

    #[test]
    fn test_smb_share_without_credentials_uses_primary_pair() {
        let mut item = shares_item();
        item.fields
            .retain(|f| !f.label.starts_with("share1 username") && !f.label.starts_with("share1 password"));
        let cfg = ResolvedConfig::from_items(&primary_item(), Some(&item), None).unwrap();
        assert_eq!(cfg.get("share1_username"), Some("alice"));
        assert_eq!(cfg.get("share1_password"), Some("hunter2"));
    }

    #[test]
    fn test_nfs_share_gets_empty_credentials() {
        let cfg = ResolvedConfig::from_items(&primary_item(), Some(&shares_item()), None).unwrap();
        assert_eq!(cfg.get("share2_username"), Some(""));
        assert_eq!(cfg.get("share2_password"), Some(""));
        assert_eq!(cfg.shares[1].kind, ShareKind::Nfs);
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let cfg = ResolvedConfig::from_items(&primary_item(), None, None).unwrap();
        assert!(cfg.hosts.is_empty() && cfg.shares.is_empty());
        assert_eq!(cfg.get("share_count"), Some("0"));
    }

    #[test]
    fn test_historical_label_spellings_resolve() {
        let item = VaultItem {
            title: labels::SHARES_ITEM.to_string(),
            vault: "homelab".to_string(),
            fields: vec![
                VaultField::text("share_count", "1"),
                VaultField::text("share_1_path", "media"),
                VaultField::text("share_1_host", "10.0.0.7"),
                VaultField::text("share_1_kind", "nfs"),
            ],
        };
        let cfg = ResolvedConfig::from_items(&primary_item(), Some(&item), None).unwrap();
        assert_eq!(cfg.get("share1"), Some("media"));
        assert_eq!(cfg.get("share1_host"), Some("10.0.0.7"));
    }

    #[test]
    fn test_garbage_count_is_invalid() {
        let item = VaultItem {
            title: labels::SHARES_ITEM.to_string(),
            vault: "homelab".to_string(),
            fields: vec![VaultField::text("share count", "many")],
        };
        let err = ResolvedConfig::from_items(&primary_item(), Some(&item), None).unwrap_err();
        assert!(matches!(err, SeedForgeError::Invalid(_)));
    }
}
