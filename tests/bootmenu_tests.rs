//! Tests for Boot-Menu Patching
//!
//! These tests verify the idempotent insert/replace behavior on a
//! realistic installer menu, the selector/timeout rewrites, and the
//! write-once backup on disk.

use std::fs;

use seedforge::bootmenu::{patch_file, MenuDocument};
use seedforge::builder::{AUTOMATED_ENTRY, AUTOMATED_ENTRY_TITLE, BOOT_TIMEOUT_SECS};

const STOCK_MENU: &str = "\
if loadfont $prefix/font.pf2 ; then\n\
  set gfxmode=800x600\n\
fi\n\
set default=\"0\"\n\
set timeout=30\n\
menuentry \"Graphical install\" {\n\
\tset background_color=black\n\
\tlinux    /install.amd/vmlinuz vga=788 --- quiet\n\
\tinitrd   /install.amd/initrd.gz\n\
}\n\
menuentry \"Install\" {\n\
\tset background_color=black\n\
\tlinux    /install.amd/vmlinuz --- quiet\n\
\tinitrd   /install.amd/initrd.gz\n\
}\n\
submenu \"Advanced options ...\" {\n\
\tmenuentry \"... Expert install\" {\n\
\t\tlinux    /install.amd/vmlinuz priority=low ---\n\
\t}\n\
}\n";

// =============================================================================
// Entry insertion and replacement
// =============================================================================

#[test]
fn first_patch_prepends_the_automated_entry() {
    let mut doc = MenuDocument::parse(STOCK_MENU);
    doc.ensure_automated_entry(AUTOMATED_ENTRY, AUTOMATED_ENTRY_TITLE);

    let text = doc.to_string();
    let auto = text.find(AUTOMATED_ENTRY_TITLE).unwrap();
    let graphical = text.find("Graphical install").unwrap();
    assert!(auto < graphical, "automated entry must come first");

    // All stock entries survive.
    for kept in ["Graphical install", "\"Install\"", "Expert install"] {
        assert!(text.contains(kept));
    }
    assert_eq!(doc.count_matching_entries(AUTOMATED_ENTRY_TITLE), 1);
}

#[test]
fn patching_twice_is_byte_identical_to_patching_once() {
    let mut doc = MenuDocument::parse(STOCK_MENU);
    doc.ensure_automated_entry(AUTOMATED_ENTRY, AUTOMATED_ENTRY_TITLE);
    doc.set_default_entry("set default=", AUTOMATED_ENTRY_TITLE);
    doc.clamp_timeout(BOOT_TIMEOUT_SECS);
    let once = doc.to_string();

    doc.ensure_automated_entry(AUTOMATED_ENTRY, AUTOMATED_ENTRY_TITLE);
    doc.set_default_entry("set default=", AUTOMATED_ENTRY_TITLE);
    doc.clamp_timeout(BOOT_TIMEOUT_SECS);
    let twice = doc.to_string();

    assert_eq!(once, twice);
    assert_eq!(doc.count_matching_entries(AUTOMATED_ENTRY_TITLE), 1);
}

#[test]
fn a_changed_entry_replaces_the_old_one_wholesale() {
    let mut doc = MenuDocument::parse(STOCK_MENU);
    let old = "menuentry \"Automated install\" {\n\tlinux /install.amd/vmlinuz url=http://old ---\n}";
    doc.ensure_automated_entry(old, AUTOMATED_ENTRY_TITLE);
    doc.ensure_automated_entry(AUTOMATED_ENTRY, AUTOMATED_ENTRY_TITLE);

    let text = doc.to_string();
    assert!(!text.contains("url=http://old"));
    assert!(text.contains("preseed/file=/cdrom/preseed.cfg"));
    assert_eq!(doc.count_matching_entries(AUTOMATED_ENTRY_TITLE), 1);
}

// =============================================================================
// Selector and timeout rewrites
// =============================================================================

#[test]
fn default_selector_points_at_the_automated_entry() {
    let mut doc = MenuDocument::parse(STOCK_MENU);
    doc.ensure_automated_entry(AUTOMATED_ENTRY, AUTOMATED_ENTRY_TITLE);
    doc.set_default_entry("set default=", AUTOMATED_ENTRY_TITLE);
    assert!(doc
        .to_string()
        .contains("set default=\"Automated install\""));
}

#[test]
fn timeout_is_reduced_to_a_short_nonzero_value() {
    let mut doc = MenuDocument::parse(STOCK_MENU);
    doc.clamp_timeout(BOOT_TIMEOUT_SECS);
    assert!(doc.to_string().contains("set timeout=5"));
    assert!(!doc.to_string().contains("set timeout=30"));
}

// =============================================================================
// On-disk patching
// =============================================================================

#[test]
fn patch_file_round_trip_with_write_once_backup() {
    let dir = tempfile::tempdir().unwrap();
    let menu = dir.path().join("grub.cfg");
    fs::write(&menu, STOCK_MENU).unwrap();

    patch_file(
        &menu,
        AUTOMATED_ENTRY,
        AUTOMATED_ENTRY_TITLE,
        AUTOMATED_ENTRY_TITLE,
        BOOT_TIMEOUT_SECS,
    )
    .unwrap();
    let first = fs::read_to_string(&menu).unwrap();

    patch_file(
        &menu,
        AUTOMATED_ENTRY,
        AUTOMATED_ENTRY_TITLE,
        AUTOMATED_ENTRY_TITLE,
        BOOT_TIMEOUT_SECS,
    )
    .unwrap();
    let second = fs::read_to_string(&menu).unwrap();
    assert_eq!(first, second);

    // The backup keeps the pristine pre-patch content across re-runs.
    let backup = dir.path().join("grub.cfg.orig");
    assert_eq!(fs::read_to_string(&backup).unwrap(), STOCK_MENU);
}

#[test]
fn patch_file_on_missing_menu_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope/grub.cfg");
    assert!(patch_file(
        &missing,
        AUTOMATED_ENTRY,
        AUTOMATED_ENTRY_TITLE,
        AUTOMATED_ENTRY_TITLE,
        BOOT_TIMEOUT_SECS,
    )
    .is_err());
}
