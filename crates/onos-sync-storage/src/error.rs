//! Storage error types for the model store abstraction.

use std::fmt;

use onos_sync_core::{CoreError, RecordId, RecordKind};

/// Errors that can occur during model store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested record was not found.
    #[error("Record not found: {kind}/{id}")]
    NotFound {
        /// The kind of record that was not found.
        kind: RecordKind,
        /// The id that was looked up.
        id: RecordId,
    },

    /// A record with the same natural key already exists.
    #[error("Record already exists: {kind} '{key}'")]
    AlreadyExists {
        /// The kind of record.
        kind: RecordKind,
        /// The natural key that clashed (name, app id, attribute name).
        key: String,
    },

    /// The record failed validation and was not written.
    #[error("Validation failed: {message}")]
    Validation {
        /// Description of why the record is invalid.
        message: String,
    },

    /// The operation was called without what it requires (caller, owner).
    #[error("Precondition failed: {message}")]
    Precondition {
        /// Description of the missing precondition.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: RecordKind, id: RecordId) -> Self {
        Self::NotFound { kind, id }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(kind: RecordKind, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            key: key.into(),
        }
    }

    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `Precondition` error.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Precondition { .. } => ErrorCategory::Precondition,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<CoreError> for StorageError {
    fn from(err: CoreError) -> Self {
        match err.category() {
            onos_sync_core::ErrorCategory::Precondition => Self::precondition(err.to_string()),
            _ => Self::validation(err.to_string()),
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Record not found.
    NotFound,
    /// Natural key clash.
    Conflict,
    /// Validation error.
    Validation,
    /// Missing caller or owner.
    Precondition,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Precondition => write!(f, "precondition"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
