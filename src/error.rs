//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout Roster.
//! All errors are structured and map to stable error codes for JSON output.
//!
//! # Error Categories
//! - `Validation`: a caller-supplied value fails a precondition checked before mutating the store
//! - `Integrity`: a mutation would orphan rows or break a relationship invariant
//! - `Storage`: the store rejected a statement or could not be opened
//! - `InvalidInput`: malformed tool arguments, unknown tables, empty SQL
//! - `CapabilityViolation`: raw SQL blocked by the tool server's capabilities
//! - `Config`: configuration file or settings resolution errors
//!
//! Lookups that find nothing are not errors: they return `None`.

use thiserror::Error;

/// Main error type for Roster operations
#[derive(Error, Debug)]
pub enum RosterError {
    /// Caller-supplied value failed a precondition
    #[error("Validation error: {0}")]
    Validation(String),

    /// Mutation refused because it would break referential integrity
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// The underlying store rejected a statement or is unreachable
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Raw statement blocked by capability constraints
    #[error("Capability violation: {0}")]
    CapabilityViolation(String),

    /// Configuration error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RosterError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling by agents.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Integrity(_) => "INTEGRITY_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::CapabilityViolation(_) => "CAPABILITY_VIOLATION",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Get human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an integrity error
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a capability violation error
    pub fn capability_violation(message: impl Into<String>) -> Self {
        Self::CapabilityViolation(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for errors caused by caller input rather than the store
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Integrity(_)
                | Self::InvalidInput(_)
                | Self::CapabilityViolation(_)
        )
    }
}

impl From<rusqlite::Error> for RosterError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type alias for Roster operations
pub type Result<T> = std::result::Result<T, RosterError>;
