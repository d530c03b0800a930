//! Secret store contract and backing implementations
//!
//! The pipeline persists and retrieves everything through the
//! `SecretStore` trait: named vaults hold named items, items hold an
//! ordered list of labeled fields. The production implementation shells
//! out to the 1Password CLI (`op`) with `--format json`; an in-memory
//! implementation backs tests.
//!
//! Labels are NOT guaranteed unique (historical schema spellings may
//! coexist in one item), so the field list preserves store order and
//! lookup is first-match-wins (see `secrets::resolver`).

// Library API - the in-memory store is consumed by the test suite
#![allow(dead_code)]

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SeedForgeError};
use crate::runner::{binary_exists, run_command, CommandOutput};
use crate::types::FieldPurpose;

/// A labeled value inside a vault item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultField {
    pub label: String,
    pub value: String,
    pub purpose: FieldPurpose,
}

impl VaultField {
    /// Plain text field.
    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            purpose: FieldPurpose::None,
        }
    }

    /// Concealed password-purpose field.
    pub fn password(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            purpose: FieldPurpose::Password,
        }
    }

    /// Username-purpose field.
    pub fn username(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            purpose: FieldPurpose::Username,
        }
    }
}

/// A named record in a named vault, with its ordered fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultItem {
    pub title: String,
    pub vault: String,
    pub fields: Vec<VaultField>,
}

/// Key/value persistence contract consumed by the pipeline.
///
/// Authentication/session establishment is an external precondition;
/// implementations surface `Denied` when it is not satisfied. Writes are
/// one logical unit per item; a mid-write failure surfaces as-is and is
/// never partially retried with a different field set.
pub trait SecretStore {
    /// Fetch an item. Fails with `NotFound` when absent.
    fn get_item(&self, title: &str, vault: &str) -> Result<VaultItem>;

    /// Create a new item. Fails with `AlreadyExists` or `Denied`.
    fn create_item(&mut self, title: &str, vault: &str, fields: &[VaultField]) -> Result<()>;

    /// Replace the fields of an existing item. Fails with `NotFound` or `Denied`.
    fn update_item(&mut self, title: &str, vault: &str, fields: &[VaultField]) -> Result<()>;

    /// Create the vault if missing; no error when it already exists.
    fn ensure_vault(&mut self, name: &str) -> Result<()>;

    /// Create-or-update convenience built on the contract.
    fn upsert_item(&mut self, title: &str, vault: &str, fields: &[VaultField]) -> Result<()> {
        match self.get_item(title, vault) {
            Ok(_) => self.update_item(title, vault, fields),
            Err(SeedForgeError::NotFound(_)) => self.create_item(title, vault, fields),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// 1Password CLI store
// ============================================================================

// op --format json item shapes (only the fields we read)

#[derive(Debug, Deserialize)]
struct OpItem {
    title: String,
    vault: OpVaultRef,
    #[serde(default)]
    fields: Vec<OpField>,
}

#[derive(Debug, Deserialize)]
struct OpVaultRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OpField {
    #[serde(default)]
    label: String,
    #[serde(default)]
    value: Option<String>,
    /// Kept as raw text: the store has more purposes (NOTES, ...) than the
    /// pipeline distinguishes; unknown ones collapse to `None`.
    #[serde(default)]
    purpose: Option<String>,
}

/// Secret store backed by the 1Password CLI.
pub struct OpCliStore;

impl OpCliStore {
    /// Verify the CLI is present and a session is established.
    pub fn connect() -> Result<Self> {
        if !binary_exists("op") {
            return Err(SeedForgeError::unsupported(
                "1Password CLI (op) is not installed",
            ));
        }
        let output = run_command("op", &["whoami"])
            .map_err(|e| SeedForgeError::general(format!("op invocation failed: {e:#}")))?;
        if !output.success {
            return Err(SeedForgeError::denied(
                "no active 1Password session; run 'op signin' first",
            ));
        }
        Ok(Self)
    }

    fn op(&self, args: &[&str]) -> Result<CommandOutput> {
        run_command("op", args)
            .map_err(|e| SeedForgeError::general(format!("op invocation failed: {e:#}")))
    }

    /// Field assignment in `op`'s `label[type]=value` syntax.
    ///
    /// Periods and equals signs in labels would be parsed as assignment
    /// syntax; the capture schema never produces them, enforced here.
    fn assignment(field: &VaultField) -> Result<String> {
        if field.label.contains(['=', '.']) {
            return Err(SeedForgeError::invalid(format!(
                "field label '{}' contains assignment syntax characters",
                field.label
            )));
        }
        let kind = match field.purpose {
            FieldPurpose::Password => "password",
            _ => "text",
        };
        Ok(format!("{}[{}]={}", field.label, kind, field.value))
    }

    fn classify_failure(output: &CommandOutput, subject: &str) -> SeedForgeError {
        let stderr = output.stderr.to_lowercase();
        if stderr.contains("isn't an item") || stderr.contains("not found") {
            SeedForgeError::not_found(subject.to_string())
        } else if stderr.contains("already exists") {
            SeedForgeError::AlreadyExists(subject.to_string())
        } else {
            SeedForgeError::denied(format!(
                "{}: {}",
                subject,
                output.stderr.lines().next().unwrap_or("op failed").trim()
            ))
        }
    }
}

impl SecretStore for OpCliStore {
    fn get_item(&self, title: &str, vault: &str) -> Result<VaultItem> {
        let output = self.op(&[
            "item", "get", title, "--vault", vault, "--format", "json", "--reveal",
        ])?;
        if !output.success {
            return Err(Self::classify_failure(
                &output,
                &format!("item '{}' in vault '{}'", title, vault),
            ));
        }
        let item = parse_op_item(&output.stdout)?;
        debug!(
            "Fetched item '{}' from vault '{}' ({} fields)",
            item.title,
            item.vault,
            item.fields.len()
        );
        Ok(item)
    }

    fn create_item(&mut self, title: &str, vault: &str, fields: &[VaultField]) -> Result<()> {
        let mut args: Vec<String> = vec![
            "item".into(),
            "create".into(),
            "--category".into(),
            "Secure Note".into(),
            "--title".into(),
            title.into(),
            "--vault".into(),
            vault.into(),
        ];
        for field in fields {
            args.push(Self::assignment(field)?);
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.op(&arg_refs)?;
        if !output.success {
            return Err(Self::classify_failure(
                &output,
                &format!("creating item '{}' in vault '{}'", title, vault),
            ));
        }
        Ok(())
    }

    fn update_item(&mut self, title: &str, vault: &str, fields: &[VaultField]) -> Result<()> {
        let mut args: Vec<String> = vec![
            "item".into(),
            "edit".into(),
            title.into(),
            "--vault".into(),
            vault.into(),
        ];
        for field in fields {
            args.push(Self::assignment(field)?);
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.op(&arg_refs)?;
        if !output.success {
            return Err(Self::classify_failure(
                &output,
                &format!("updating item '{}' in vault '{}'", title, vault),
            ));
        }
        Ok(())
    }

    fn ensure_vault(&mut self, name: &str) -> Result<()> {
        let probe = self.op(&["vault", "get", name])?;
        if probe.success {
            return Ok(());
        }
        let output = self.op(&["vault", "create", name])?;
        if !output.success {
            return Err(SeedForgeError::denied(format!(
                "creating vault '{}': {}",
                name,
                output.stderr.lines().next().unwrap_or("op failed").trim()
            )));
        }
        Ok(())
    }
}

/// Parse an `op item get --format json` payload into the store model.
fn parse_op_item(json: &str) -> Result<VaultItem> {
    let raw: OpItem = serde_json::from_str(json)?;
    let fields = raw
        .fields
        .into_iter()
        .map(|f| VaultField {
            label: f.label,
            value: f.value.unwrap_or_default(),
            purpose: match f.purpose.as_deref() {
                Some("USERNAME") => FieldPurpose::Username,
                Some("PASSWORD") => FieldPurpose::Password,
                _ => FieldPurpose::None,
            },
        })
        .collect();
    Ok(VaultItem {
        title: raw.title,
        vault: raw.vault.name,
        fields,
    })
}

// ============================================================================
// In-memory store (tests, rehearsal)
// ============================================================================

/// Volatile `SecretStore` with the same contract semantics as the CLI
/// store, backing the test suite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    vaults: std::collections::BTreeSet<String>,
    items: std::collections::BTreeMap<(String, String), VaultItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(title: &str, vault: &str) -> (String, String) {
        (vault.to_string(), title.to_string())
    }
}

impl SecretStore for MemoryStore {
    fn get_item(&self, title: &str, vault: &str) -> Result<VaultItem> {
        self.items
            .get(&Self::key(title, vault))
            .cloned()
            .ok_or_else(|| {
                SeedForgeError::not_found(format!("item '{}' in vault '{}'", title, vault))
            })
    }

    fn create_item(&mut self, title: &str, vault: &str, fields: &[VaultField]) -> Result<()> {
        let key = Self::key(title, vault);
        if self.items.contains_key(&key) {
            return Err(SeedForgeError::AlreadyExists(format!(
                "item '{}' in vault '{}'",
                title, vault
            )));
        }
        self.items.insert(
            key,
            VaultItem {
                title: title.to_string(),
                vault: vault.to_string(),
                fields: fields.to_vec(),
            },
        );
        Ok(())
    }

    fn update_item(&mut self, title: &str, vault: &str, fields: &[VaultField]) -> Result<()> {
        let key = Self::key(title, vault);
        match self.items.get_mut(&key) {
            Some(item) => {
                item.fields = fields.to_vec();
                Ok(())
            }
            None => Err(SeedForgeError::not_found(format!(
                "item '{}' in vault '{}'",
                title, vault
            ))),
        }
    }

    fn ensure_vault(&mut self, name: &str) -> Result<()> {
        self.vaults.insert(name.to_string());
        Ok(())
    }
}
