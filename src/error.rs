//! Custom error types for plinkk-audit
//!
//! This module defines the error hierarchy for the library using thiserror.
//! Restoration failures get their own variants so callers can map them to
//! user-facing responses without string matching.

use thiserror::Error;

/// The main error type for plinkk-audit operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// The audit entry to restore to does not exist
    #[error("Audit log entry not found: {0}")]
    LogNotFound(String),

    /// The audit entry has no target entity
    #[error("Audit log entry {0} has no target to restore")]
    NoTargetId(String),

    /// No entity type could be resolved for the entry's action
    #[error("Cannot resolve an entity type for action '{0}'")]
    UnresolvedModel(String),

    /// The target entity was removed after the entry was written
    #[error("{entity_type} no longer exists: {identifier}")]
    EntityGone {
        entity_type: &'static str,
        identifier: String,
    },

    /// The entity changed between reading the history and applying the patch
    #[error("{entity_type} {identifier} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        entity_type: &'static str,
        identifier: String,
        expected: u64,
        found: u64,
    },
}

impl AuditError {
    /// Create a "not found" error for entities of the given type
    pub fn entity_not_found(entity_type: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::LogNotFound(_) | Self::EntityGone { .. }
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came out of a restoration attempt
    pub fn is_restore_failure(&self) -> bool {
        matches!(
            self,
            Self::LogNotFound(_)
                | Self::NoTargetId(_)
                | Self::UnresolvedModel(_)
                | Self::EntityGone { .. }
                | Self::Conflict { .. }
        )
    }

    /// HTTP-equivalent status code for surfacing the error to a client
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::LogNotFound(_) | Self::EntityGone { .. } => 404,
            Self::Validation(_) | Self::NoTargetId(_) | Self::UnresolvedModel(_) => 400,
            Self::Conflict { .. } | Self::Duplicate { .. } => 409,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Storage(_) => 500,
        }
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for plinkk-audit operations
pub type AuditResult<T> = Result<T, AuditError>;
