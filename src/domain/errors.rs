//! Domain error types
//!
//! This module defines the error hierarchy for Cairn.
//! All errors are domain-specific and don't expose third-party types.

use crate::domain::schema::FieldViolation;
use thiserror::Error;

/// Main Cairn error type
///
/// This is the primary error type used throughout the service core.
/// Variants follow the failure classes of the dataset update workflow:
/// errors raised before the commit abort the whole operation, errors
/// raised after it are logged by the caller and never surfaced.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Unauthenticated caller or missing permission
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Dataset is held by a conflicting operation
    #[error("Lock conflict: {0}")]
    LockConflict(String),

    /// Malformed field data (strict mode) or unknown entities in the request
    #[error("Validation error: {message}")]
    Validation {
        /// Summary message
        message: String,
        /// Field-level detail
        violations: Vec<FieldViolation>,
    },

    /// Persistence store errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Persistent identifier errors
    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Search index errors
    #[error("Index error: {0}")]
    Index(String),

    /// Metadata export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Notification or mail delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl RepositoryError {
    /// Creates a validation error without field-level detail
    pub fn validation(message: impl Into<String>) -> Self {
        RepositoryError::Validation {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Returns true for errors that abort an operation before any mutation
    pub fn is_precondition_failure(&self) -> bool {
        matches!(
            self,
            RepositoryError::Authorization(_)
                | RepositoryError::LockConflict(_)
                | RepositoryError::Validation { .. }
        )
    }
}

/// Persistence store errors
///
/// These errors don't expose the database driver types.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Failed to connect to the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Entity not found
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique or foreign key constraint violated
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction could not be committed
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// Stored document could not be decoded
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Persistent identifier errors
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// Registry reported that the identifier is already taken
    #[error("Identifier already exists: {0}")]
    Collision(String),

    /// Registry unreachable or transport failure
    #[error("Identifier registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// Registry answered with something we could not interpret
    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),

    /// No candidate identifier could be produced
    #[error("Identifier generation failed: {0}")]
    GenerationFailed(String),

    /// Malformed global identifier string
    #[error("Invalid global identifier: {0}")]
    InvalidGlobalId(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RepositoryError {
    fn from(err: toml::de::Error) -> Self {
        RepositoryError::Configuration(format!("TOML parse error: {err}"))
    }
}
