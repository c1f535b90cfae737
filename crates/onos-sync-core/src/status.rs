//! Backend status carried by every synchronized record.
//!
//! The status doubles as the "dirty" marker: a record whose code is
//! [`BackendCode::Pending`] is waiting for (re-)reconciliation.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Message written when a record converged.
pub const STATUS_OK: &str = "OK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendCode {
    #[default]
    Pending,
    Ok,
    Error,
}

impl BackendCode {
    /// Numeric code as exposed to operators (0 pending, 1 ok, 2 error).
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Ok => 1,
            Self::Error => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub code: BackendCode,
    #[serde(default)]
    pub message: String,
    /// Consecutive fatal failures. Deferrals leave it untouched.
    #[serde(default)]
    pub failures: u32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub next_attempt: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
}

impl BackendStatus {
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            code: BackendCode::Pending,
            message: message.into(),
            failures: 0,
            next_attempt: None,
            updated: OffsetDateTime::now_utc(),
        }
    }

    /// Mark dirty, keeping the failure counter.
    pub fn mark_pending(&mut self, message: impl Into<String>) {
        self.code = BackendCode::Pending;
        self.message = message.into();
        self.next_attempt = None;
        self.updated = OffsetDateTime::now_utc();
    }

    pub fn mark_ok(&mut self) {
        self.code = BackendCode::Ok;
        self.message = STATUS_OK.to_string();
        self.failures = 0;
        self.next_attempt = None;
        self.updated = OffsetDateTime::now_utc();
    }

    /// A deferral keeps the record dirty without counting a failure.
    pub fn mark_deferred(&mut self, reason: impl Into<String>) {
        self.code = BackendCode::Pending;
        self.message = reason.into();
        self.updated = OffsetDateTime::now_utc();
    }

    pub fn mark_failed(&mut self, message: impl Into<String>, next_attempt: OffsetDateTime) {
        self.code = BackendCode::Error;
        self.message = message.into();
        self.failures = self.failures.saturating_add(1);
        self.next_attempt = Some(next_attempt);
        self.updated = OffsetDateTime::now_utc();
    }

    pub fn is_dirty(&self) -> bool {
        self.code == BackendCode::Pending
    }

    pub fn is_ok(&self) -> bool {
        self.code == BackendCode::Ok
    }

    /// Whether the scheduler should pick this record up at `now`.
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        match self.code {
            BackendCode::Pending => true,
            BackendCode::Ok => false,
            BackendCode::Error => self.next_attempt.is_none_or(|at| at <= now),
        }
    }
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self::pending("")
    }
}
