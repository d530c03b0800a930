//! seedforge library
//!
//! Configuration resolution and discovery pipeline for unattended
//! installer media: subnet/host/service discovery, interactive capture of
//! host and share records, secret-store persistence with multi-strategy
//! field resolution, answer-file templating, and idempotent boot-menu
//! patching. Image download/extraction, package installation and ISO
//! mastering are external collaborators invoked around this pipeline.

pub mod bootmenu;
pub mod builder;
pub mod capture;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod records;
pub mod resolved;
pub mod runner;
pub mod sanity;
pub mod secrets;
pub mod template;
pub mod types;

// Re-export main types for convenience
pub use bootmenu::MenuDocument;
pub use builder::{BuildPlan, BuildReport};
pub use capture::prompt::{Prompter, ScriptedPrompter, TermPrompter};
pub use capture::{CaptureSession, Discovery, NetDiscovery};
pub use discovery::Subnet;
pub use error::{Result, SeedForgeError};
pub use records::{CaptureOutcome, Credentials, Host, PrimaryAccount, Share};
pub use resolved::ResolvedConfig;
pub use secrets::{MemoryStore, OpCliStore, SecretStore, VaultField, VaultItem};
pub use types::{FieldPurpose, ServiceKind, ShareKind};
