// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery: replay a session's chain or convict it
//!
//! Recovery loads every commit in sequence order and validates sequence
//! continuity, hash-chain integrity, and timestamp monotonicity before
//! replaying coverage deltas. Any integrity failure trips the sticky
//! corruption flag, permanently blocking the session.

use crate::error::RecoveryError;
use tracing::{debug, error, warn};
use wl_core::{
    chain_commit_sha256, sha256_hex, validate_session_id, Clock, CommitRecord, CoverageDelta,
    CoverageGrid, GENESIS_SHA256,
};
use wl_storage::QualityStore;

/// Outcome of a recovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStatus {
    /// Chain validated; the grid reflects every replayed delta
    Completed,
    /// An integrity check failed; the session is now permanently blocked
    CorruptedEvidence,
    /// The session exceeds the recovery scan cap. Not sticky: the
    /// session is not convicted, just too large to replay here.
    ExcessiveCommits,
}

/// Result of `recover_session`
#[derive(Debug, Clone)]
pub struct RecoveryReport {
    pub status: RecoveryStatus,
    pub recovered_commits: u64,
    pub coverage_grid: Option<CoverageGrid>,
}

impl RecoveryReport {
    fn failed(status: RecoveryStatus) -> Self {
        Self {
            status,
            recovered_commits: 0,
            coverage_grid: None,
        }
    }
}

/// Deepest failure a chain scan can attribute to one commit
struct ChainViolation {
    commit_sha256: String,
    reason: String,
}

/// Replay a session from the store, validating the full chain.
pub fn recover_session<C: Clock>(
    store: &QualityStore,
    clock: &C,
    session_id: &str,
) -> Result<RecoveryReport, RecoveryError> {
    validate_session_id(session_id)?;

    // A session already convicted stays convicted; no re-scan
    if store.has_corrupted_evidence(session_id)? {
        debug!(session_id, "recovery short-circuit: sticky corruption flag set");
        return Ok(RecoveryReport::failed(RecoveryStatus::CorruptedEvidence));
    }

    // Cap the scan before loading any rows; an oversized session is
    // refused without ever materializing its payloads
    let count = store.commit_count(session_id)?;
    if count > store.limits().max_session_commits as u64 {
        warn!(
            session_id,
            count,
            cap = store.limits().max_session_commits,
            "recovery refused: session exceeds commit cap"
        );
        return Ok(RecoveryReport::failed(RecoveryStatus::ExcessiveCommits));
    }

    let commits = store.commits_for_session(session_id)?;

    if let Err(violation) = validate_chain(&commits) {
        error!(
            session_id,
            commit_sha256 = %violation.commit_sha256,
            reason = %violation.reason,
            "chain validation failed, convicting session"
        );
        store.set_corrupted_evidence(
            session_id,
            &violation.commit_sha256,
            clock.monotonic_ms(),
        )?;
        return Ok(RecoveryReport::failed(RecoveryStatus::CorruptedEvidence));
    }

    let mut grid = CoverageGrid::new();
    for commit in &commits {
        match CoverageDelta::decode(&commit.coverage_delta_payload, store.limits()) {
            Ok(delta) => grid.apply_delta(&delta),
            Err(err) => {
                error!(
                    session_id,
                    session_seq = commit.session_seq,
                    %err,
                    "coverage delta failed to decode, convicting session"
                );
                store.set_corrupted_evidence(
                    session_id,
                    &commit.commit_sha256,
                    clock.monotonic_ms(),
                )?;
                return Ok(RecoveryReport::failed(RecoveryStatus::CorruptedEvidence));
            }
        }
    }

    debug!(
        session_id,
        recovered = commits.len(),
        "recovery completed"
    );
    Ok(RecoveryReport {
        status: RecoveryStatus::Completed,
        recovered_commits: commits.len() as u64,
        coverage_grid: Some(grid),
    })
}

/// Validate continuity, the hash chain, and timestamp monotonicity.
fn validate_chain(commits: &[CommitRecord]) -> Result<(), ChainViolation> {
    let mut prev: Option<&CommitRecord> = None;

    for (index, commit) in commits.iter().enumerate() {
        let violation = |reason: String| ChainViolation {
            commit_sha256: commit.commit_sha256.clone(),
            reason,
        };

        let expected_seq = index as u64 + 1;
        if commit.session_seq != expected_seq {
            return Err(violation(format!(
                "sequence {} where {expected_seq} was expected",
                commit.session_seq
            )));
        }

        if !commit.digests_well_formed() {
            return Err(violation("malformed digest".to_string()));
        }

        match prev {
            None => {
                if commit.prev_commit_sha256 != GENESIS_SHA256 {
                    return Err(violation("first commit does not chain from genesis".to_string()));
                }
            }
            Some(predecessor) => {
                if commit.prev_commit_sha256 != predecessor.commit_sha256 {
                    return Err(violation(format!(
                        "chain break: prev digest does not match commit {}",
                        predecessor.session_seq
                    )));
                }
                if commit.ts_monotonic_ms < predecessor.ts_monotonic_ms {
                    return Err(violation(format!(
                        "timestamp {} regressed below {}",
                        commit.ts_monotonic_ms, predecessor.ts_monotonic_ms
                    )));
                }
            }
        }

        let recomputed = chain_commit_sha256(
            &commit.prev_commit_sha256,
            &commit.audit_sha256,
            &commit.coverage_delta_sha256,
        );
        if recomputed != commit.commit_sha256 {
            return Err(violation("stored commit digest does not match chain inputs".to_string()));
        }

        // Payload tampering is corruption even when the digest text chains
        if sha256_hex(&commit.audit_payload) != commit.audit_sha256 {
            return Err(violation("audit payload does not match its digest".to_string()));
        }
        if sha256_hex(&commit.coverage_delta_payload) != commit.coverage_delta_sha256 {
            return Err(violation(
                "coverage delta payload does not match its digest".to_string(),
            ));
        }

        prev = Some(commit);
    }

    Ok(())
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
