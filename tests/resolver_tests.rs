//! Tests for Secret Field Resolution
//!
//! These tests verify the ordered-lookup contract against realistic
//! store items, including the historical label spellings and the
//! redaction semantics.

use seedforge::error::SeedForgeError;
use seedforge::secrets::labels;
use seedforge::secrets::resolver::{resolve, resolve_spec};
use seedforge::secrets::store::{VaultField, VaultItem};
use seedforge::types::FieldPurpose;

fn item_with(fields: Vec<VaultField>) -> VaultItem {
    VaultItem {
        title: "Primary credentials".to_string(),
        vault: "homelab".to_string(),
        fields,
    }
}

// =============================================================================
// Ordering invariants
// =============================================================================

#[test]
fn canonical_label_beats_alternates_even_when_both_exist() {
    let item = item_with(vec![
        VaultField::password("user_password", "legacy"),
        VaultField::password("password", "current"),
    ]);
    let value = resolve(&item, "password", &["user_password"], None).unwrap();
    assert_eq!(value, "current");
}

#[test]
fn alternates_resolve_in_listed_order_not_field_order() {
    // The item stores "rootpw" before "root_password", but the caller
    // lists "root_password" first.
    let item = item_with(vec![
        VaultField::password("rootpw", "older"),
        VaultField::password("root_password", "newer"),
    ]);
    let value = resolve(&item, "root password", &["root_password", "rootpw"], None).unwrap();
    assert_eq!(value, "newer");
}

#[test]
fn empty_alternates_and_no_canonical_match_is_not_found() {
    let item = item_with(vec![
        VaultField::username("username", "alice"),
        VaultField::password("password", "hunter2"),
    ]);
    // Never another field's value.
    let err = resolve(&item, "root password", &[], None).unwrap_err();
    assert!(matches!(err, SeedForgeError::NotFound(_)));
}

#[test]
fn purpose_fallback_is_the_last_strategy() {
    let item = item_with(vec![
        VaultField::password("some legacy label", "by-purpose"),
    ]);
    let value = resolve(&item, "password", &["user_password"], Some(FieldPurpose::Password))
        .unwrap();
    assert_eq!(value, "by-purpose");
}

#[test]
fn duplicate_labels_resolve_to_the_first_occurrence() {
    let item = item_with(vec![
        VaultField::text("username", "first"),
        VaultField::text("username", "second"),
        VaultField::text("username", "third"),
    ]);
    assert_eq!(resolve(&item, "username", &[], None).unwrap(), "first");
}

// =============================================================================
// Redaction semantics
// =============================================================================

#[test]
fn concealed_value_is_a_placeholder_failure_not_a_value() {
    let item = item_with(vec![VaultField::password(
        "password",
        labels::CONCEALED_TOKEN,
    )]);
    let err = resolve(&item, "password", &[], Some(FieldPurpose::Password)).unwrap_err();
    assert!(matches!(err, SeedForgeError::Placeholder(_)));
}

#[test]
fn placeholder_failure_is_distinct_from_not_found() {
    let concealed = item_with(vec![VaultField::password("password", "CONCEALED")]);
    let absent = item_with(vec![]);
    assert!(matches!(
        resolve(&concealed, "password", &[], None),
        Err(SeedForgeError::Placeholder(_))
    ));
    assert!(matches!(
        resolve(&absent, "password", &[], None),
        Err(SeedForgeError::NotFound(_))
    ));
}

#[test]
fn later_strategy_with_real_value_rescues_a_concealed_canonical() {
    let item = item_with(vec![
        VaultField::password("password", "CONCEALED"),
        VaultField::password("user_password", "hunter2"),
    ]);
    let value = resolve(&item, "password", &["user_password"], None).unwrap();
    assert_eq!(value, "hunter2");
}

// =============================================================================
// Label table specs
// =============================================================================

#[test]
fn label_specs_resolve_their_historical_spellings() {
    let item = item_with(vec![
        VaultField::username("login", "alice"),
        VaultField::password("user password", "hunter2"),
        VaultField::password("rootpw", "toor"),
        VaultField::text("ssh key", "ssh-ed25519 AAAA..."),
    ]);
    assert_eq!(resolve_spec(&item, &labels::USERNAME).unwrap(), "alice");
    assert_eq!(
        resolve_spec(&item, &labels::USER_PASSWORD).unwrap(),
        "hunter2"
    );
    assert_eq!(resolve_spec(&item, &labels::ROOT_PASSWORD).unwrap(), "toor");
    assert_eq!(
        resolve_spec(&item, &labels::SSH_AUTHORIZED_KEY).unwrap(),
        "ssh-ed25519 AAAA..."
    );
}

#[test]
fn root_password_never_falls_back_to_the_user_password_purpose() {
    // Only a PASSWORD-purpose field exists; the root-password spec must
    // not pick it up via purpose fallback.
    let item = item_with(vec![VaultField::password("password", "hunter2")]);
    assert!(matches!(
        resolve_spec(&item, &labels::ROOT_PASSWORD),
        Err(SeedForgeError::NotFound(_))
    ));
}

#[test]
fn resolution_does_not_mutate_the_item() {
    let item = item_with(vec![
        VaultField::username("username", "alice"),
        VaultField::password("password", "hunter2"),
    ]);
    let before = item.clone();
    let _ = resolve(&item, "username", &[], None);
    let _ = resolve(&item, "nothing", &[], Some(FieldPurpose::Password));
    assert_eq!(item, before);
}
