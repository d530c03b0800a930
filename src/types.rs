//! Type-safe enums for the discovery and secrets pipeline
//!
//! This module replaces stringly-typed values with proper Rust enums
//! that provide compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Network service detected on a discovered host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum ServiceKind {
    /// SMB/CIFS file sharing (TCP 445)
    #[strum(serialize = "SMB")]
    Smb,
    /// NFS exports (TCP 2049)
    #[strum(serialize = "NFS")]
    Nfs,
    /// Web management interface (80/443/8006/8080/9090 collapsed)
    #[strum(serialize = "Management")]
    Management,
}

impl ServiceKind {
    /// Well-known probe ports for this service kind.
    pub fn ports(self) -> &'static [u16] {
        match self {
            Self::Smb => &[445],
            Self::Nfs => &[2049],
            Self::Management => &[80, 443, 8006, 8080, 9090],
        }
    }
}

/// How a share was obtained and what credentials it requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum ShareKind {
    /// SMB share selected from enumeration; requires a username/password pair
    #[strum(serialize = "smb")]
    Smb,
    /// NFS export selected from enumeration; requires no credentials
    #[strum(serialize = "nfs")]
    Nfs,
    /// Operator-entered share; requires operator-entered values
    #[default]
    #[strum(serialize = "manual")]
    Manual,
}

impl ShareKind {
    /// Whether this kind requires a username/password pair to mount.
    pub fn requires_credentials(self) -> bool {
        matches!(self, Self::Smb | Self::Manual)
    }
}

/// Semantic role tag of a secret-store field, independent of its label text.
///
/// Matches the store's own concept of field purpose; the resolver uses it
/// as the last lookup strategy when no label spelling matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldPurpose {
    #[default]
    #[strum(serialize = "NONE")]
    #[serde(alias = "")]
    None,
    #[strum(serialize = "USERNAME")]
    Username,
    #[strum(serialize = "PASSWORD")]
    Password,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_service_kind_roundtrip() {
        assert_eq!(ServiceKind::Smb.to_string(), "SMB");
        assert_eq!(ServiceKind::from_str("NFS").unwrap(), ServiceKind::Nfs);
    }

    #[test]
    fn test_share_kind_credential_requirements() {
        assert!(ShareKind::Smb.requires_credentials());
        assert!(ShareKind::Manual.requires_credentials());
        assert!(!ShareKind::Nfs.requires_credentials());
    }

    #[test]
    fn test_purpose_deserializes_from_store_json() {
        let p: FieldPurpose = serde_json::from_str("\"PASSWORD\"").unwrap();
        assert_eq!(p, FieldPurpose::Password);
        let p: FieldPurpose = serde_json::from_str("\"\"").unwrap();
        assert_eq!(p, FieldPurpose::None);
    }

    #[test]
    fn test_management_collapses_multiple_ports() {
        assert!(ServiceKind::Management.ports().len() > 1);
        assert_eq!(ServiceKind::Smb.ports(), &[445]);
    }
}
