// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit-log schema and versioned bootstrap

use crate::error::StoreError;
use rusqlite::{Connection, OptionalExtension};

/// Version of the persisted schema
pub const STORE_SCHEMA_VERSION: i64 = 1;

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS commits (
        sequence INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        session_seq INTEGER NOT NULL,
        ts_monotonic_ms INTEGER NOT NULL,
        ts_wallclock_real REAL NOT NULL,
        audit_payload BLOB NOT NULL,
        coverage_delta_payload BLOB NOT NULL,
        audit_sha256 TEXT NOT NULL,
        coverage_delta_sha256 TEXT NOT NULL,
        prev_commit_sha256 TEXT NOT NULL,
        commit_sha256 TEXT NOT NULL,
        schema_version INTEGER NOT NULL,
        UNIQUE (session_id, session_seq)
    );
    CREATE INDEX IF NOT EXISTS idx_commits_session
        ON commits (session_id, session_seq);
    CREATE TABLE IF NOT EXISTS session_counters (
        session_id TEXT PRIMARY KEY,
        next_seq INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS session_flags (
        session_id TEXT PRIMARY KEY,
        corrupted_evidence_sticky INTEGER NOT NULL DEFAULT 0,
        first_corrupt_commit_sha TEXT,
        ts_first_corrupt_ms INTEGER
    );
";

/// Create the schema on first use, or validate the stored version.
pub fn bootstrap(conn: &mut Connection) -> Result<(), StoreError> {
    let tx = conn
        .transaction()
        .map_err(|e| StoreError::from_sqlite("bootstrap", e))?;

    tx.execute_batch("CREATE TABLE IF NOT EXISTS schema_meta (version INTEGER NOT NULL);")
        .map_err(|e| StoreError::from_sqlite("bootstrap", e))?;

    let version: Option<i64> = tx
        .query_row("SELECT version FROM schema_meta LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| StoreError::from_sqlite("bootstrap", e))?;

    match version {
        None => {
            tx.execute(
                "INSERT INTO schema_meta (version) VALUES (?1)",
                [STORE_SCHEMA_VERSION],
            )
            .map_err(|e| StoreError::from_sqlite("bootstrap", e))?;
            tx.execute_batch(CREATE_TABLES)
                .map_err(|e| StoreError::from_sqlite("bootstrap", e))?;
        }
        Some(STORE_SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(StoreError::DatabaseUnknown {
                op: "bootstrap",
                code: 0,
                message: format!(
                    "unsupported schema version {other}, expected {STORE_SCHEMA_VERSION}"
                ),
            });
        }
    }

    tx.commit()
        .map_err(|e| StoreError::from_sqlite("bootstrap", e))
}
