//! Out-of-band tampering must be caught and convicted

use crate::prelude::*;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wl_engine::{CommitError, RecoveryStatus};

/// Write a three-commit session and return the store path.
fn seeded_ledger(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("ledger.db");
    let committer = committer_at(&path);
    for i in 0..3u32 {
        committer
            .commit_white("s", &sample_audit("R1"), &sample_delta(&[(i, 2)]))
            .unwrap();
    }
    path
}

fn raw_sql(path: &Path, sql: &str, params: &[&dyn rusqlite::ToSql]) {
    let conn = Connection::open(path).unwrap();
    conn.execute(sql, params).unwrap();
}

fn assert_convicted(path: &Path) {
    let committer = committer_at(path);

    let report = committer.recover_session("s").unwrap();
    assert_eq!(report.status, RecoveryStatus::CorruptedEvidence);
    assert_eq!(report.recovered_commits, 0);
    assert!(report.coverage_grid.is_none());

    // Sticky: the verdict repeats and commits are blocked for good
    let again = committer.recover_session("s").unwrap();
    assert_eq!(again.status, RecoveryStatus::CorruptedEvidence);
    let err = committer
        .commit_white("s", &sample_audit("R1"), &sample_delta(&[]))
        .unwrap_err();
    assert!(matches!(err, CommitError::CorruptedEvidence { .. }));
}

#[test]
fn flipping_one_commit_digest_bit_convicts_the_session() {
    let dir = TempDir::new().unwrap();
    let path = seeded_ledger(&dir);

    let conn = Connection::open(&path).unwrap();
    let sha: String = conn
        .query_row(
            "SELECT commit_sha256 FROM commits WHERE session_id = 's' AND session_seq = 2",
            [],
            |row| row.get(0),
        )
        .unwrap();
    drop(conn);
    raw_sql(
        &path,
        "UPDATE commits SET commit_sha256 = ?1 WHERE session_id = 's' AND session_seq = 2",
        &[&flip_hex_char(&sha)],
    );

    assert_convicted(&path);
}

#[test]
fn rewinding_a_timestamp_convicts_the_session() {
    let dir = TempDir::new().unwrap();
    let path = seeded_ledger(&dir);

    raw_sql(
        &path,
        "UPDATE commits SET ts_monotonic_ms = 0 WHERE session_id = 's' AND session_seq = 3",
        &[],
    );
    // Make the first commits strictly later than zero
    raw_sql(
        &path,
        "UPDATE commits SET ts_monotonic_ms = ts_monotonic_ms + 10
         WHERE session_id = 's' AND session_seq < 3",
        &[],
    );

    assert_convicted(&path);
}

#[test]
fn deleting_a_row_leaves_a_gap_and_convicts_the_session() {
    let dir = TempDir::new().unwrap();
    let path = seeded_ledger(&dir);

    raw_sql(
        &path,
        "DELETE FROM commits WHERE session_id = 's' AND session_seq = 2",
        &[],
    );

    assert_convicted(&path);
}

#[test]
fn tampering_a_payload_convicts_the_session() {
    let dir = TempDir::new().unwrap();
    let path = seeded_ledger(&dir);

    raw_sql(
        &path,
        "UPDATE commits SET audit_payload = ?1 WHERE session_id = 's' AND session_seq = 1",
        &[&b"forged".to_vec()],
    );

    assert_convicted(&path);
}

#[test]
fn forged_row_appended_out_of_band_is_caught() {
    let dir = TempDir::new().unwrap();
    let path = seeded_ledger(&dir);

    // An attacker appends seq 4 chained to a digest of their choosing,
    // bypassing allocation entirely
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO commits (
            session_id, session_seq, ts_monotonic_ms, ts_wallclock_real,
            audit_payload, coverage_delta_payload,
            audit_sha256, coverage_delta_sha256,
            prev_commit_sha256, commit_sha256, schema_version
         ) VALUES ('s', 4, 99999, 0.0, x'00', x'00000000',
                   ?1, ?2, ?3, ?4, 1)",
        params![
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d",
            "df3f619804a92fdb4057192dc43dd748ea778adc52bc498ce80524c014b81119",
            "deadbeef".repeat(8),
            "deadbeef".repeat(8),
        ],
    )
    .unwrap();
    drop(conn);

    assert_convicted(&path);
}
