//! Canonical field labels and their historical alternates
//!
//! Items written by older captures carry different label spellings for the
//! same logical field. All spellings live here so the resolver and the
//! capture writer agree on one table; nothing else hardcodes label text.

use crate::types::FieldPurpose;

/// Redaction token the store substitutes when a concealed value cannot be
/// revealed. Resolving to this literal is a fatal `Placeholder` failure.
pub const CONCEALED_TOKEN: &str = "CONCEALED";

/// Item titles for the three logical records.
pub const PRIMARY_ITEM: &str = "Primary credentials";
pub const SHARES_ITEM: &str = "Discovered shares";
pub const HOSTS_ITEM: &str = "Discovered hosts";

/// Default vault name.
pub const DEFAULT_VAULT: &str = "homelab";

/// A logical field: canonical label, historical alternates, and the
/// purpose used as the last-resort lookup strategy.
#[derive(Debug, Clone, Copy)]
pub struct LabelSpec {
    pub canonical: &'static str,
    pub alternates: &'static [&'static str],
    pub fallback_purpose: Option<FieldPurpose>,
}

pub const USERNAME: LabelSpec = LabelSpec {
    canonical: "username",
    alternates: &["user name", "user", "login"],
    fallback_purpose: Some(FieldPurpose::Username),
};

pub const USER_PASSWORD: LabelSpec = LabelSpec {
    canonical: "password",
    alternates: &["user password", "user_password"],
    fallback_purpose: Some(FieldPurpose::Password),
};

pub const ROOT_PASSWORD: LabelSpec = LabelSpec {
    canonical: "root password",
    alternates: &["root_password", "rootpw"],
    // Deliberately no purpose fallback: the PASSWORD-purpose field in the
    // primary item is the user password, never root's.
    fallback_purpose: None,
};

pub const SSH_AUTHORIZED_KEY: LabelSpec = LabelSpec {
    canonical: "ssh public key",
    alternates: &["ssh_authorized_key", "ssh key", "public key"],
    fallback_purpose: None,
};

pub const HOST_COUNT: LabelSpec = LabelSpec {
    canonical: "host count",
    alternates: &["host_count", "hosts"],
    fallback_purpose: None,
};

pub const SHARE_COUNT: LabelSpec = LabelSpec {
    canonical: "share count",
    alternates: &["share_count", "shares"],
    fallback_purpose: None,
};

/// Label of the Nth share's primary field (its path), 1-based.
pub fn share_label(ordinal: usize) -> String {
    format!("share{}", ordinal)
}

/// Label of an attribute field of the Nth share (`share2 host`, ...).
pub fn share_attr_label(ordinal: usize, attr: &str) -> String {
    format!("share{} {}", ordinal, attr)
}

/// Historical spelling of the same attribute (`share_2_host`).
pub fn share_attr_alternate(ordinal: usize, attr: &str) -> String {
    format!("share_{}_{}", ordinal, attr)
}

/// Label of the Nth host's primary field (its address), 1-based.
pub fn host_label(ordinal: usize) -> String {
    format!("host{}", ordinal)
}

/// Label of an attribute field of the Nth host (`host1 name`).
pub fn host_attr_label(ordinal: usize, attr: &str) -> String {
    format!("host{} {}", ordinal, attr)
}

/// Historical spelling of the same attribute (`host_1_name`).
pub fn host_attr_alternate(ordinal: usize, attr: &str) -> String {
    format!("host_{}_{}", ordinal, attr)
}
