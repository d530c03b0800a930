//! Network discovery: subnet detection, host scanning, service probing
//! and share enumeration.
//!
//! Everything here degrades rather than aborts: a missing tool falls back
//! to the next strategy (nmap → ping sweep) or to manual capture, and an
//! empty network is a valid result.

pub mod probe;
pub mod scanner;
pub mod shares;
pub mod subnet;

pub use probe::{detect_services, detect_services_at};
pub use scanner::scan_subnet;
pub use shares::{list_nfs_exports, list_smb_shares};
pub use subnet::{detect_local_subnet, Subnet};
