//! Result of one reconciliation attempt.
//!
//! A reconciler never signals "retry later" through an error. It returns a
//! [`SyncOutcome`] and the scheduler branches on it: converged records are
//! marked ok, deferred records stay dirty without counting a failure, and
//! failed records back off.

use std::path::PathBuf;

use onos_sync_core::{CoreError, RecordId, RecordKind};
use onos_sync_gateway::GatewayError;
use onos_sync_storage::StorageError;
use thiserror::Error;

#[derive(Debug)]
pub enum SyncOutcome {
    Converged,
    Deferred(Deferral),
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn deferred(record: RecordId, reason: impl Into<String>) -> Self {
        Self::Deferred(Deferral {
            record,
            reason: reason.into(),
        })
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Result<(), SyncError>> for SyncOutcome {
    fn from(result: Result<(), SyncError>) -> Self {
        match result {
            Ok(()) => Self::Converged,
            Err(err) => Self::Failed(err),
        }
    }
}

/// Preconditions unmet; not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferral {
    pub record: RecordId,
    pub reason: String,
}

impl std::fmt::Display for Deferral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Fatal failure of one attempt.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{kind} {record}: {source}")]
    Remote {
        kind: RecordKind,
        record: RecordId,
        #[source]
        source: GatewayError,
    },

    #[error("The version of {app_id} you installed ({installed}) is not the same you requested ({requested})")]
    VersionMismatch {
        record: RecordId,
        app_id: String,
        installed: String,
        requested: String,
    },

    #[error("{kind} {record}: {message}")]
    Validation {
        kind: RecordKind,
        record: RecordId,
        message: String,
    },

    #[error("{kind} {record}: {message}")]
    Precondition {
        kind: RecordKind,
        record: RecordId,
        message: String,
    },

    #[error("Failed to write {}: {source}", path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SyncError {
    pub fn remote(kind: RecordKind, record: RecordId, source: GatewayError) -> Self {
        Self::Remote {
            kind,
            record,
            source,
        }
    }

    pub fn validation(kind: RecordKind, record: RecordId, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            record,
            message: message.into(),
        }
    }

    pub fn precondition(kind: RecordKind, record: RecordId, message: impl Into<String>) -> Self {
        Self::Precondition {
            kind,
            record,
            message: message.into(),
        }
    }

    /// Wraps a record-level [`CoreError`] (bad attribute value, missing placeholder).
    pub fn from_core(kind: RecordKind, record: RecordId, err: CoreError) -> Self {
        Self::validation(kind, record, err.to_string())
    }

    pub fn local_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalFile {
            path: path.into(),
            source,
        }
    }

    /// Whether a later attempt can succeed without anyone editing the model.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote { .. } | Self::LocalFile { .. } => true,
            Self::Storage(err) => matches!(
                err.category(),
                onos_sync_storage::ErrorCategory::Internal
            ),
            Self::VersionMismatch { .. } | Self::Validation { .. } | Self::Precondition { .. } => {
                false
            }
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Remote { .. } => ErrorCategory::Remote,
            Self::VersionMismatch { .. } => ErrorCategory::PolicyViolation,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Precondition { .. } => ErrorCategory::Precondition,
            Self::LocalFile { .. } => ErrorCategory::LocalIo,
            Self::Storage(_) => ErrorCategory::Storage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Remote,
    PolicyViolation,
    Validation,
    Precondition,
    LocalIo,
    Storage,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::PolicyViolation => write!(f, "policy_violation"),
            Self::Validation => write!(f, "validation"),
            Self::Precondition => write!(f, "precondition"),
            Self::LocalIo => write!(f, "local_io"),
            Self::Storage => write!(f, "storage"),
        }
    }
}
