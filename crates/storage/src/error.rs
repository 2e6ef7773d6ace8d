// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed storage error taxonomy
//!
//! Every underlying SQLite error is mapped into one of these variants,
//! carrying the operation tag and extended result code so callers can
//! decide retry policy by matching on kind rather than inspecting
//! message text.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors surfaced by the quality store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database busy during {op} (extended code {code})")]
    DatabaseBusy { op: &'static str, code: i32 },
    #[error("database locked during {op} (extended code {code})")]
    DatabaseLocked { op: &'static str, code: i32 },
    #[error("database I/O failure during {op} (extended code {code})")]
    DatabaseIo { op: &'static str, code: i32 },
    #[error("database corrupt during {op} (extended code {code})")]
    DatabaseCorrupt { op: &'static str, code: i32 },
    #[error("database full during {op} (extended code {code})")]
    DatabaseFull { op: &'static str, code: i32 },
    #[error("database error during {op} (extended code {code}): {message}")]
    DatabaseUnknown {
        op: &'static str,
        code: i32,
        message: String,
    },
    /// A write failed closed: the row would have violated a ledger
    /// invariant, or the session is already marked corrupt.
    #[error("corrupted evidence during {op}: {reason}")]
    CorruptedEvidence { op: &'static str, reason: String },
    /// A durability pragma did not read back with the required value.
    #[error("durability configuration rejected: {pragma} is {actual:?}, need {expected}")]
    Durability {
        pragma: &'static str,
        expected: &'static str,
        actual: String,
    },
}

impl StoreError {
    /// True for contention errors worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::DatabaseBusy { .. } | StoreError::DatabaseLocked { .. }
        )
    }

    /// Map a rusqlite error into the closed taxonomy.
    pub fn from_sqlite(op: &'static str, err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message) => {
                let code = failure.extended_code;
                match failure.code {
                    ErrorCode::DatabaseBusy => StoreError::DatabaseBusy { op, code },
                    ErrorCode::DatabaseLocked => StoreError::DatabaseLocked { op, code },
                    ErrorCode::SystemIoFailure => StoreError::DatabaseIo { op, code },
                    ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => {
                        StoreError::DatabaseCorrupt { op, code }
                    }
                    ErrorCode::DiskFull => StoreError::DatabaseFull { op, code },
                    _ => StoreError::DatabaseUnknown {
                        op,
                        code,
                        message: message
                            .clone()
                            .unwrap_or_else(|| err.to_string()),
                    },
                }
            }
            _ => StoreError::DatabaseUnknown {
                op,
                code: 0,
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
