// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed quality store
//!
//! Owns the embedded store file: durability configuration (verified by
//! reading back every pragma, not by trusting the command), schema
//! bootstrap, atomic sequence allocation, the sticky corruption flag,
//! and exclusive transaction control. Inserts fail closed: a row that
//! would violate a ledger invariant is rejected before it is written.

use crate::error::StoreError;
use crate::schema;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use wl_core::{
    chain_commit_sha256, sha256_hex, validate_session_id, CommitRecord, LedgerLimits,
    GENESIS_SHA256, SCHEMA_VERSION,
};

/// How long a connection waits on SQLite locks before reporting busy.
/// Retry budgeting above this lives in the committer's loop.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Persisted per-session corruption state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFlags {
    pub corrupted_evidence_sticky: bool,
    pub first_corrupt_commit_sha: Option<String>,
    pub ts_first_corrupt_ms: Option<u64>,
}

/// SQLite-backed store for the white-commit ledger
pub struct QualityStore {
    conn: Connection,
    limits: LedgerLimits,
}

impl QualityStore {
    /// Open or create a store at the given path.
    pub fn open(path: &Path, limits: LedgerLimits) -> Result<Self, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| StoreError::from_sqlite("open", e))?;
        Self::from_connection(conn, limits)
    }

    /// Open an in-memory store for testing.
    pub fn open_in_memory(limits: LedgerLimits) -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::from_sqlite("open", e))?;
        Self::from_connection(conn, limits)
    }

    fn from_connection(mut conn: Connection, limits: LedgerLimits) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
            .map_err(|e| StoreError::from_sqlite("open", e))?;
        configure_durability(&conn)?;
        schema::bootstrap(&mut conn)?;
        debug!("quality store opened");
        Ok(Self { conn, limits })
    }

    pub fn limits(&self) -> &LedgerLimits {
        &self.limits
    }

    /// Begin an exclusive-lock transaction. No other writer can
    /// interleave until commit or rollback.
    pub fn begin_exclusive(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch("BEGIN EXCLUSIVE")
            .map_err(|e| StoreError::from_sqlite("begin_exclusive", e))
    }

    /// Commit the open transaction.
    pub fn commit_tx(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| StoreError::from_sqlite("commit_tx", e))
    }

    /// Roll back the open transaction.
    pub fn rollback_tx(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| StoreError::from_sqlite("rollback_tx", e))
    }

    /// Allocate and return the next sequence number for a session.
    ///
    /// A single upsert statement, so allocation is race-free even across
    /// processes; never a read-then-increment-then-write sequence.
    pub fn next_session_seq(&self, session_id: &str) -> Result<u64, StoreError> {
        self.conn
            .query_row(
                "INSERT INTO session_counters (session_id, next_seq) VALUES (?1, 1)
                 ON CONFLICT (session_id) DO UPDATE SET next_seq = next_seq + 1
                 RETURNING next_seq",
                params![session_id],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| StoreError::from_sqlite("next_session_seq", e))
            .map(|seq| seq as u64)
    }

    /// Digest a new commit must chain from: the genesis hash for the
    /// first sequence number, otherwise the prior row's commit digest.
    pub fn prev_commit_sha256(
        &self,
        session_id: &str,
        session_seq: u64,
    ) -> Result<String, StoreError> {
        if session_seq == 0 {
            return Err(StoreError::CorruptedEvidence {
                op: "prev_commit_sha256",
                reason: "sequence numbers start at 1".to_string(),
            });
        }
        if session_seq == 1 {
            return Ok(GENESIS_SHA256.to_string());
        }
        let prev: Option<String> = self
            .conn
            .query_row(
                "SELECT commit_sha256 FROM commits
                 WHERE session_id = ?1 AND session_seq = ?2",
                params![session_id, (session_seq - 1) as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::from_sqlite("prev_commit_sha256", e))?;
        prev.ok_or_else(|| StoreError::CorruptedEvidence {
            op: "prev_commit_sha256",
            reason: format!(
                "no predecessor row for {session_id} seq {}",
                session_seq - 1
            ),
        })
    }

    /// Insert a commit row after re-validating every invariant.
    pub fn insert_commit(&self, record: &CommitRecord) -> Result<(), StoreError> {
        self.validate_commit(record)?;
        self.conn
            .execute(
                "INSERT INTO commits (
                    session_id, session_seq, ts_monotonic_ms, ts_wallclock_real,
                    audit_payload, coverage_delta_payload,
                    audit_sha256, coverage_delta_sha256,
                    prev_commit_sha256, commit_sha256, schema_version
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.session_id,
                    record.session_seq as i64,
                    record.ts_monotonic_ms as i64,
                    record.ts_wallclock_real,
                    record.audit_payload,
                    record.coverage_delta_payload,
                    record.audit_sha256,
                    record.coverage_delta_sha256,
                    record.prev_commit_sha256,
                    record.commit_sha256,
                    record.schema_version as i64,
                ],
            )
            .map_err(|e| StoreError::from_sqlite("insert_commit", e))?;
        Ok(())
    }

    fn validate_commit(&self, record: &CommitRecord) -> Result<(), StoreError> {
        let fail = |reason: String| StoreError::CorruptedEvidence {
            op: "insert_commit",
            reason,
        };

        if let Err(err) = validate_session_id(&record.session_id) {
            return Err(fail(err.to_string()));
        }
        if record.session_seq == 0 {
            return Err(fail("sequence numbers start at 1".to_string()));
        }
        if !record.digests_well_formed() {
            return Err(fail("malformed digest".to_string()));
        }
        if (record.session_seq == 1) != (record.prev_commit_sha256 == GENESIS_SHA256) {
            return Err(fail(format!(
                "genesis hash mismatch at seq {}",
                record.session_seq
            )));
        }
        if record.audit_payload.len() > self.limits.max_payload_bytes
            || record.coverage_delta_payload.len() > self.limits.max_payload_bytes
        {
            return Err(fail(format!(
                "payload exceeds {} bytes",
                self.limits.max_payload_bytes
            )));
        }
        if sha256_hex(&record.audit_payload) != record.audit_sha256 {
            return Err(fail("audit payload does not match its digest".to_string()));
        }
        if sha256_hex(&record.coverage_delta_payload) != record.coverage_delta_sha256 {
            return Err(fail(
                "coverage delta payload does not match its digest".to_string(),
            ));
        }
        let expected = chain_commit_sha256(
            &record.prev_commit_sha256,
            &record.audit_sha256,
            &record.coverage_delta_sha256,
        );
        if expected != record.commit_sha256 {
            return Err(fail("commit digest does not match chain inputs".to_string()));
        }
        if record.schema_version != SCHEMA_VERSION {
            return Err(fail(format!(
                "unsupported commit schema version {}",
                record.schema_version
            )));
        }
        Ok(())
    }

    /// Whether the session's sticky corruption flag is set.
    pub fn has_corrupted_evidence(&self, session_id: &str) -> Result<bool, StoreError> {
        let sticky: Option<i64> = self
            .conn
            .query_row(
                "SELECT corrupted_evidence_sticky FROM session_flags WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::from_sqlite("has_corrupted_evidence", e))?;
        Ok(sticky.unwrap_or(0) != 0)
    }

    /// Mark a session permanently corrupt. The first reported corruption
    /// wins; later reports never overwrite the stored sha or timestamp.
    pub fn set_corrupted_evidence(
        &self,
        session_id: &str,
        first_corrupt_commit_sha: &str,
        ts_first_corrupt_ms: u64,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO session_flags (
                    session_id, corrupted_evidence_sticky,
                    first_corrupt_commit_sha, ts_first_corrupt_ms
                 ) VALUES (?1, 1, ?2, ?3)
                 ON CONFLICT (session_id) DO NOTHING",
                params![
                    session_id,
                    first_corrupt_commit_sha,
                    ts_first_corrupt_ms as i64
                ],
            )
            .map_err(|e| StoreError::from_sqlite("set_corrupted_evidence", e))?;
        Ok(())
    }

    /// Read the session's full flag row, if present.
    pub fn session_flags(&self, session_id: &str) -> Result<Option<SessionFlags>, StoreError> {
        self.conn
            .query_row(
                "SELECT corrupted_evidence_sticky, first_corrupt_commit_sha, ts_first_corrupt_ms
                 FROM session_flags WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok(SessionFlags {
                        corrupted_evidence_sticky: row.get::<_, i64>(0)? != 0,
                        first_corrupt_commit_sha: row.get(1)?,
                        ts_first_corrupt_ms: row
                            .get::<_, Option<i64>>(2)?
                            .map(|ms| ms as u64),
                    })
                },
            )
            .optional()
            .map_err(|e| StoreError::from_sqlite("session_flags", e))
    }

    /// All commits for a session, strictly ordered by sequence number.
    pub fn commits_for_session(&self, session_id: &str) -> Result<Vec<CommitRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT session_id, session_seq, ts_monotonic_ms, ts_wallclock_real,
                        audit_payload, coverage_delta_payload,
                        audit_sha256, coverage_delta_sha256,
                        prev_commit_sha256, commit_sha256, schema_version
                 FROM commits WHERE session_id = ?1
                 ORDER BY session_seq ASC",
            )
            .map_err(|e| StoreError::from_sqlite("commits_for_session", e))?;

        let rows = stmt
            .query_map(params![session_id], map_commit_row)
            .map_err(|e| StoreError::from_sqlite("commits_for_session", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::from_sqlite("commits_for_session", e))
    }

    /// Monotonic timestamp of the chain head, if the session has any
    /// commits. Cheaper than loading the full head row.
    pub fn latest_ts_monotonic_ms(&self, session_id: &str) -> Result<Option<u64>, StoreError> {
        self.conn
            .query_row(
                "SELECT ts_monotonic_ms FROM commits WHERE session_id = ?1
                 ORDER BY session_seq DESC LIMIT 1",
                params![session_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(|e| StoreError::from_sqlite("latest_ts_monotonic_ms", e))
            .map(|ts| ts.map(|ms| ms as u64))
    }

    /// The chain head, if the session has any commits.
    pub fn latest_commit(&self, session_id: &str) -> Result<Option<CommitRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT session_id, session_seq, ts_monotonic_ms, ts_wallclock_real,
                        audit_payload, coverage_delta_payload,
                        audit_sha256, coverage_delta_sha256,
                        prev_commit_sha256, commit_sha256, schema_version
                 FROM commits WHERE session_id = ?1
                 ORDER BY session_seq DESC LIMIT 1",
                params![session_id],
                map_commit_row,
            )
            .optional()
            .map_err(|e| StoreError::from_sqlite("latest_commit", e))
    }

    /// Number of commits stored for a session.
    pub fn commit_count(&self, session_id: &str) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM commits WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::from_sqlite("commit_count", e))?;
        Ok(count as u64)
    }
}

fn map_commit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommitRecord> {
    Ok(CommitRecord {
        session_id: row.get(0)?,
        session_seq: row.get::<_, i64>(1)? as u64,
        ts_monotonic_ms: row.get::<_, i64>(2)? as u64,
        ts_wallclock_real: row.get(3)?,
        audit_payload: row.get(4)?,
        coverage_delta_payload: row.get(5)?,
        audit_sha256: row.get(6)?,
        coverage_delta_sha256: row.get(7)?,
        prev_commit_sha256: row.get(8)?,
        commit_sha256: row.get(9)?,
        schema_version: row.get::<_, i64>(10)? as u32,
    })
}

/// Apply and verify the durability pragmas.
///
/// Each setting is read back after it is applied; a store whose pragmas
/// do not hold the required values is refused, not trusted.
fn configure_durability(conn: &Connection) -> Result<(), StoreError> {
    // journal_mode returns the resulting mode as a row
    let mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(|e| StoreError::from_sqlite("configure_durability", e))?;
    // In-memory databases report "memory"; both are acceptable journals
    if !mode.eq_ignore_ascii_case("wal") && !mode.eq_ignore_ascii_case("memory") {
        return Err(StoreError::Durability {
            pragma: "journal_mode",
            expected: "wal",
            actual: mode,
        });
    }

    conn.execute_batch("PRAGMA synchronous = FULL")
        .map_err(|e| StoreError::from_sqlite("configure_durability", e))?;
    let synchronous: i64 = conn
        .query_row("PRAGMA synchronous", [], |row| row.get(0))
        .map_err(|e| StoreError::from_sqlite("configure_durability", e))?;
    // 2 = FULL, 3 = EXTRA
    if synchronous < 2 {
        return Err(StoreError::Durability {
            pragma: "synchronous",
            expected: "FULL",
            actual: synchronous.to_string(),
        });
    }

    conn.execute_batch("PRAGMA foreign_keys = ON")
        .map_err(|e| StoreError::from_sqlite("configure_durability", e))?;
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .map_err(|e| StoreError::from_sqlite("configure_durability", e))?;
    if foreign_keys != 1 {
        return Err(StoreError::Durability {
            pragma: "foreign_keys",
            expected: "ON",
            actual: foreign_keys.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
