// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the committer and recovery

use thiserror::Error;
use wl_core::{AuditError, DeltaError, SessionIdError};
use wl_storage::StoreError;

/// Errors that can occur while committing
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("invalid session id: {0}")]
    InvalidSessionId(#[from] SessionIdError),
    /// The session's sticky corruption flag is set; no commit may ever
    /// succeed for it again.
    #[error("corrupted evidence: session {session_id} is permanently blocked")]
    CorruptedEvidence { session_id: String },
    #[error("audit encoding failed: {0}")]
    Audit(#[from] AuditError),
    #[error("coverage delta rejected: {0}")]
    Delta(#[from] DeltaError),
    #[error("{what} payload is {len} bytes, maximum is {max}")]
    PayloadTooLarge {
        what: &'static str,
        len: usize,
        max: usize,
    },
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        source: StoreError,
    },
}

/// Errors that can occur while recovering a session
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("invalid session id: {0}")]
    InvalidSessionId(#[from] SessionIdError),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
