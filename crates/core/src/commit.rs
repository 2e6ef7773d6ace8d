// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit row and durable token data model

use crate::hash::{is_sha256_hex, GENESIS_SHA256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version stamped into every commit row and durable token
pub const SCHEMA_VERSION: u32 = 1;

/// Maximum session identifier length in bytes
pub const MAX_SESSION_ID_BYTES: usize = 64;

/// Errors from session identifier validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionIdError {
    #[error("session id is empty")]
    Empty,
    #[error("session id is {len} bytes, maximum is {MAX_SESSION_ID_BYTES}")]
    TooLong { len: usize },
    #[error("session id contains invalid character {ch:?}")]
    InvalidChar { ch: char },
}

/// Validate a session identifier: 1–64 bytes of ASCII alphanumerics
/// plus `-`, `_`, `.`, `:`.
pub fn validate_session_id(session_id: &str) -> Result<(), SessionIdError> {
    if session_id.is_empty() {
        return Err(SessionIdError::Empty);
    }
    if session_id.len() > MAX_SESSION_ID_BYTES {
        return Err(SessionIdError::TooLong {
            len: session_id.len(),
        });
    }
    for ch in session_id.chars() {
        let ok = ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':');
        if !ok {
            return Err(SessionIdError::InvalidChar { ch });
        }
    }
    Ok(())
}

/// One immutable row of the commit log
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    pub session_id: String,
    /// Position in the session's chain, contiguous from 1
    pub session_seq: u64,
    /// Monotonic timeline, non-decreasing within a session
    pub ts_monotonic_ms: u64,
    /// Wallclock Unix seconds, informational only
    pub ts_wallclock_real: f64,
    pub audit_payload: Vec<u8>,
    pub coverage_delta_payload: Vec<u8>,
    pub audit_sha256: String,
    pub coverage_delta_sha256: String,
    /// Genesis hash for the first commit, else the predecessor's digest
    pub prev_commit_sha256: String,
    pub commit_sha256: String,
    pub schema_version: u32,
}

impl CommitRecord {
    /// True when this row claims the genesis position.
    pub fn is_genesis(&self) -> bool {
        self.session_seq == 1 && self.prev_commit_sha256 == GENESIS_SHA256
    }

    /// Check digest shapes without recomputing any hash.
    pub fn digests_well_formed(&self) -> bool {
        is_sha256_hex(&self.audit_sha256)
            && is_sha256_hex(&self.coverage_delta_sha256)
            && is_sha256_hex(&self.prev_commit_sha256)
            && is_sha256_hex(&self.commit_sha256)
    }
}

/// Proof of a successful commit, returned to the caller
///
/// Derived entirely from the row just written; serializes with the wire
/// field names consumed by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurableToken {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "sessionSeq")]
    pub session_seq: u64,
    pub commit_sha256: String,
    pub ts_monotonic_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_delta_sha256: Option<String>,
}

impl DurableToken {
    /// Build a token from a freshly written commit row.
    pub fn from_record(record: &CommitRecord, include_debug_digests: bool) -> Self {
        Self {
            schema_version: record.schema_version,
            session_id: record.session_id.clone(),
            session_seq: record.session_seq,
            commit_sha256: record.commit_sha256.clone(),
            ts_monotonic_ms: record.ts_monotonic_ms,
            audit_sha256: include_debug_digests.then(|| record.audit_sha256.clone()),
            coverage_delta_sha256: include_debug_digests
                .then(|| record.coverage_delta_sha256.clone()),
        }
    }
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
