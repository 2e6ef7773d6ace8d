// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The white committer: one atomic, hash-chained commit end to end
//!
//! Payload encoding and hashing happen outside any transaction and are
//! retry-safe. The allocate-hash-insert sequence runs inside an
//! exclusive store transaction, retried with bounded exponential backoff
//! on transient contention only. A process-local mutex serializes
//! in-process callers, so observed contention comes from other
//! processes, not from self-contention.

use crate::config::CommitterConfig;
use crate::error::{CommitError, RecoveryError};
use crate::recovery::{self, RecoveryReport};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};
use wl_core::{
    chain_commit_sha256, sha256_hex, validate_session_id, AuditRecord, Clock, CommitRecord,
    CoverageDelta, DurableToken, SystemClock, SCHEMA_VERSION,
};
use wl_storage::{QualityStore, StoreError};

/// Orchestrates white commits against one quality store
pub struct WhiteCommitter<C: Clock = SystemClock> {
    store: Mutex<QualityStore>,
    config: CommitterConfig,
    clock: C,
}

impl WhiteCommitter<SystemClock> {
    /// Wrap a store with the default config and system clock.
    pub fn new(store: QualityStore) -> Self {
        Self::with_config(store, CommitterConfig::default(), SystemClock::new())
    }
}

impl<C: Clock> WhiteCommitter<C> {
    pub fn with_config(store: QualityStore, config: CommitterConfig, clock: C) -> Self {
        Self {
            store: Mutex::new(store),
            config,
            clock,
        }
    }

    /// Atomically append a white commit and return its durable token.
    ///
    /// Steps, strictly ordered: validate the session id, fail fast if
    /// the session is marked corrupt, encode and hash the payloads, then
    /// retry the exclusive-transaction append on transient contention
    /// until it lands or the attempt budget is spent.
    pub fn commit_white(
        &self,
        session_id: &str,
        audit: &AuditRecord,
        delta: &CoverageDelta,
    ) -> Result<DurableToken, CommitError> {
        validate_session_id(session_id)?;

        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());

        if store.has_corrupted_evidence(session_id)? {
            warn!(session_id, "commit refused: sticky corruption flag is set");
            return Err(CommitError::CorruptedEvidence {
                session_id: session_id.to_string(),
            });
        }

        // Pure and retry-safe, so computed once outside the loop
        let audit_payload = audit.encode_canonical()?;
        let max_payload = store.limits().max_payload_bytes;
        if audit_payload.len() > max_payload {
            return Err(CommitError::PayloadTooLarge {
                what: "audit",
                len: audit_payload.len(),
                max: max_payload,
            });
        }
        let delta_payload = delta.encode();
        if delta_payload.len() > max_payload {
            return Err(CommitError::PayloadTooLarge {
                what: "coverage delta",
                len: delta_payload.len(),
                max: max_payload,
            });
        }
        let audit_sha256 = sha256_hex(&audit_payload);
        let coverage_delta_sha256 = sha256_hex(&delta_payload);

        let mut last_transient: Option<StoreError> = None;
        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 {
                std::thread::sleep(self.backoff_delay(attempt));
            }

            match self.try_append(
                &store,
                session_id,
                &audit_payload,
                &audit_sha256,
                &delta_payload,
                &coverage_delta_sha256,
            ) {
                Ok(record) => {
                    debug!(
                        session_id,
                        session_seq = record.session_seq,
                        attempt,
                        "white commit landed"
                    );
                    return Ok(DurableToken::from_record(
                        &record,
                        self.config.include_debug_digests,
                    ));
                }
                Err(err) if err.is_transient() => {
                    warn!(session_id, attempt, %err, "transient contention, will retry");
                    last_transient = Some(err);
                }
                Err(err) => return Err(CommitError::Store(err)),
            }
        }

        let source = last_transient.unwrap_or(StoreError::DatabaseUnknown {
            op: "commit_white",
            code: 0,
            message: "retry budget of zero attempts".to_string(),
        });
        Err(CommitError::MaxRetriesExceeded {
            attempts: self.config.max_attempts,
            source,
        })
    }

    /// Replay and validate a session. See [`recovery::recover_session`].
    pub fn recover_session(&self, session_id: &str) -> Result<RecoveryReport, RecoveryError> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        recovery::recover_session(&store, &self.clock, session_id)
    }

    /// One exclusive-transaction append attempt.
    fn try_append(
        &self,
        store: &QualityStore,
        session_id: &str,
        audit_payload: &[u8],
        audit_sha256: &str,
        delta_payload: &[u8],
        coverage_delta_sha256: &str,
    ) -> Result<CommitRecord, StoreError> {
        store.begin_exclusive()?;

        let result = (|| {
            let session_seq = store.next_session_seq(session_id)?;
            let prev_commit_sha256 = store.prev_commit_sha256(session_id, session_seq)?;
            // A fresh clock starts its own timeline and can sit behind a
            // chain written by an earlier process; clamp to the chain
            // head so the stored timeline never regresses
            let ts_floor = store.latest_ts_monotonic_ms(session_id)?.unwrap_or(0);
            let commit_sha256 =
                chain_commit_sha256(&prev_commit_sha256, audit_sha256, coverage_delta_sha256);
            let record = CommitRecord {
                session_id: session_id.to_string(),
                session_seq,
                ts_monotonic_ms: self.clock.monotonic_ms().max(ts_floor),
                ts_wallclock_real: self.clock.wallclock_unix(),
                audit_payload: audit_payload.to_vec(),
                coverage_delta_payload: delta_payload.to_vec(),
                audit_sha256: audit_sha256.to_string(),
                coverage_delta_sha256: coverage_delta_sha256.to_string(),
                prev_commit_sha256,
                commit_sha256,
                schema_version: SCHEMA_VERSION,
            };
            store.insert_commit(&record)?;
            Ok(record)
        })();

        match result {
            Ok(record) => {
                store.commit_tx()?;
                Ok(record)
            }
            Err(err) => {
                // The attempt either commits or rolls back; a failed
                // rollback leaves the original error as the cause
                let _ = store.rollback_tx();
                Err(err)
            }
        }
    }

    /// Exponential backoff before the given attempt, capped.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(2).min(16);
        let delay = self.config.backoff_base.saturating_mul(1u32 << doublings);
        delay.min(self.config.backoff_cap)
    }
}

#[cfg(test)]
#[path = "committer_tests.rs"]
mod tests;
