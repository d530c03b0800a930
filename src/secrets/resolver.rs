//! Multi-strategy field resolution over a vault item
//!
//! Translates a logical field (canonical label, historical alternates, an
//! optional purpose fallback) into a concrete value from one item.
//!
//! # Design
//!
//! - **Ordered strategies**: exact canonical label, then each alternate in
//!   listed order, then first field with the fallback purpose. First
//!   non-empty match short-circuits.
//! - **Pure logic**: strategies are pure functions over an item snapshot.
//!   No I/O, no mutation; repeatable for auditing and tests.
//! - **Duplicate tolerance**: labels may repeat across schema versions;
//!   scans are order-stable and the first usable match wins.
//! - **Redaction is fatal**: a matched value equal to the store's
//!   redaction token is a `Placeholder` failure, never a value: a
//!   concealed secret must abort the build rather than leak a literal
//!   `CONCEALED` into generated artifacts.

use tracing::debug;

use crate::error::{Result, SeedForgeError};
use crate::secrets::labels::{LabelSpec, CONCEALED_TOKEN};
use crate::secrets::store::{VaultItem, VaultField};
use crate::types::FieldPurpose;

/// Outcome of one strategy pass over the field list.
enum Scan {
    /// Usable value.
    Hit(String),
    /// A field matched but its value is the redaction token.
    Redacted(String),
    /// Nothing matched (or only empty values).
    Miss,
}

/// Resolve a logical field against an item.
///
/// Strategy order is strict: `canonical` label first, then `alternates`
/// in listed order, then `fallback_purpose`. A redacted match anywhere is
/// remembered; if no later strategy produces a real value the result is a
/// `Placeholder` failure rather than `NotFound`, so the caller can tell
/// "field absent" from "field present but concealed".
pub fn resolve(
    item: &VaultItem,
    canonical: &str,
    alternates: &[&str],
    fallback_purpose: Option<FieldPurpose>,
) -> Result<String> {
    let mut redacted: Option<String> = None;

    let mut consider = |scan: Scan| -> Option<String> {
        match scan {
            Scan::Hit(value) => Some(value),
            Scan::Redacted(label) => {
                redacted.get_or_insert(label);
                None
            }
            Scan::Miss => None,
        }
    };

    if let Some(value) = consider(by_label(item, canonical)) {
        return Ok(value);
    }
    for alternate in alternates {
        if let Some(value) = consider(by_label(item, alternate)) {
            debug!(
                "Resolved '{}' in item '{}' via alternate label '{}'",
                canonical, item.title, alternate
            );
            return Ok(value);
        }
    }
    if let Some(purpose) = fallback_purpose {
        if let Some(value) = consider(by_purpose(item, purpose)) {
            debug!(
                "Resolved '{}' in item '{}' via purpose {}",
                canonical, item.title, purpose
            );
            return Ok(value);
        }
    }

    match redacted {
        Some(label) => Err(SeedForgeError::placeholder(label)),
        None => Err(SeedForgeError::not_found(format!(
            "field '{}' in item '{}'",
            canonical, item.title
        ))),
    }
}

/// Resolve using a `LabelSpec` from the label table.
pub fn resolve_spec(item: &VaultItem, spec: &LabelSpec) -> Result<String> {
    resolve(item, spec.canonical, spec.alternates, spec.fallback_purpose)
}

/// First-match-wins scan by exact label.
fn by_label(item: &VaultItem, label: &str) -> Scan {
    scan(item.fields.iter().filter(|f| f.label == label))
}

/// First-match-wins scan by purpose tag.
fn by_purpose(item: &VaultItem, purpose: FieldPurpose) -> Scan {
    scan(item.fields.iter().filter(|f| f.purpose == purpose))
}

fn scan<'a>(fields: impl Iterator<Item = &'a VaultField>) -> Scan {
    let mut redacted = None;
    for field in fields {
        if field.value.is_empty() {
            // Empty duplicates are skipped, later spellings may still hit.
            continue;
        }
        if field.value == CONCEALED_TOKEN {
            redacted.get_or_insert(field.label.clone());
            continue;
        }
        return Scan::Hit(field.value.clone());
    }
    match redacted {
        Some(label) => Scan::Redacted(label),
        None => Scan::Miss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::store::VaultField;

    fn item(fields: Vec<VaultField>) -> VaultItem {
        VaultItem {
            title: "Primary credentials".to_string(),
            vault: "homelab".to_string(),
            fields,
        }
    }

    #[test]
    fn test_canonical_label_wins_over_alternate() {
        let item = item(vec![
            VaultField::text("user_password", "old-spelling"),
            VaultField::text("password", "canonical"),
        ]);
        let value = resolve(&item, "password", &["user_password"], None).unwrap();
        assert_eq!(value, "canonical");
    }

    #[test]
    fn test_alternates_tried_in_listed_order() {
        let item = item(vec![
            VaultField::text("rootpw", "second"),
            VaultField::text("root_password", "first"),
        ]);
        let value = resolve(&item, "root password", &["root_password", "rootpw"], None).unwrap();
        assert_eq!(value, "first");
    }

    #[test]
    fn test_no_match_is_not_found_never_another_field() {
        let item = item(vec![VaultField::text("password", "hunter2")]);
        let err = resolve(&item, "root password", &[], None).unwrap_err();
        assert!(matches!(err, SeedForgeError::NotFound(_)));
    }

    #[test]
    fn test_purpose_fallback_when_no_label_matches() {
        let item = item(vec![
            VaultField::text("notes", "n/a"),
            VaultField::password("pw (legacy)", "hunter2"),
        ]);
        let value = resolve(&item, "password", &[], Some(FieldPurpose::Password)).unwrap();
        assert_eq!(value, "hunter2");
    }

    #[test]
    fn test_label_match_preempts_purpose_fallback() {
        let item = item(vec![
            VaultField::password("other secret", "wrong"),
            VaultField::text("password", "right"),
        ]);
        let value = resolve(&item, "password", &[], Some(FieldPurpose::Password)).unwrap();
        assert_eq!(value, "right");
    }

    #[test]
    fn test_redaction_token_is_placeholder_failure() {
        let item = item(vec![VaultField::password("password", "CONCEALED")]);
        let err = resolve(&item, "password", &[], None).unwrap_err();
        assert!(matches!(err, SeedForgeError::Placeholder(_)));
    }

    #[test]
    fn test_real_value_elsewhere_beats_redacted_match() {
        let item = item(vec![
            VaultField::password("password", "CONCEALED"),
            VaultField::text("user_password", "hunter2"),
        ]);
        let value = resolve(&item, "password", &["user_password"], None).unwrap();
        assert_eq!(value, "hunter2");
    }

    #[test]
    fn test_duplicate_labels_first_match_wins() {
        let item = item(vec![
            VaultField::text("username", "alice"),
            VaultField::text("username", "bob"),
        ]);
        let value = resolve(&item, "username", &[], None).unwrap();
        assert_eq!(value, "alice");
    }

    #[test]
    fn test_empty_duplicate_is_skipped() {
        let item = item(vec![
            VaultField::text("username", ""),
            VaultField::text("username", "alice"),
        ]);
        let value = resolve(&item, "username", &[], None).unwrap();
        assert_eq!(value, "alice");
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let item = item(vec![VaultField::text("username", "alice")]);
        let first = resolve(&item, "username", &[], None).unwrap();
        let second = resolve(&item, "username", &[], None).unwrap();
        assert_eq!(first, second);
    }
}
