//! Error handling module for seedforge
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the pipeline should use these types for consistency.
//!
//! The variants mirror the recovery policy of the pipeline: `NotFound`,
//! `Unreachable`, `Unsupported` and `Invalid` are recoverable (fallback
//! strategy, manual entry, or re-prompt); `Denied` and `Placeholder` are
//! terminal and abort the build before any artifact is written.

#![allow(dead_code)] // Error variants and helpers are available for future use

use thiserror::Error;

/// Main error type for the seedforge pipeline
#[derive(Error, Debug)]
pub enum SeedForgeError {
    /// IO errors (file operations, subprocess plumbing)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lookup target absent (vault item, field, host)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authorization or reveal failure from the secret store
    #[error("Access denied: {0}")]
    Denied(String),

    /// Host or service could not be reached
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// Required external tool is missing
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Operator input out of bounds or malformed
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// A redacted value was returned where a real value was required
    #[error("Redacted placeholder for '{0}' cannot be used in generated artifacts")]
    Placeholder(String),

    /// Item creation collided with an existing item
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Operator aborted an interactive session
    #[error("Capture aborted by operator")]
    Aborted,

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for seedforge operations
pub type Result<T> = std::result::Result<T, SeedForgeError>;

// Convenient error constructors
impl SeedForgeError {
    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a denied error
    pub fn denied(msg: impl Into<String>) -> Self {
        Self::Denied(msg.into())
    }

    /// Create an unreachable error
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    /// Create an unsupported (missing tool) error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an invalid-input error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Create a placeholder error for a redacted field
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self::Placeholder(label.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }

    /// Returns true if the pipeline may degrade to another strategy
    /// (or re-prompt) instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Unreachable(_) | Self::Unsupported(_) | Self::Invalid(_)
        )
    }
}
