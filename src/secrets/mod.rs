//! Secret store access: persistence contract, label schema, and the
//! multi-strategy field resolver.

pub mod labels;
pub mod resolver;
pub mod store;

pub use resolver::{resolve, resolve_spec};
pub use store::{MemoryStore, OpCliStore, SecretStore, VaultField, VaultItem};
