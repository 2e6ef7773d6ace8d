//! Committing white commits end to end against an on-disk store

use crate::prelude::*;
use tempfile::TempDir;
use wl_engine::{CommitError, RecoveryStatus};

#[test]
fn commits_survive_process_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");

    let first_token;
    {
        let committer = committer_at(&path);
        first_token = committer
            .commit_white("session-1", &sample_audit("R1"), &sample_delta(&[(3, 1)]))
            .unwrap();
        committer
            .commit_white("session-1", &sample_audit("R2"), &sample_delta(&[(5, 2)]))
            .unwrap();
    }

    // A fresh committer over the same file sees the chain and extends it
    let committer = committer_at(&path);
    let third = committer
        .commit_white("session-1", &sample_audit("R3"), &sample_delta(&[(7, 1)]))
        .unwrap();
    assert_eq!(first_token.session_seq, 1);
    assert_eq!(third.session_seq, 3);

    let report = committer.recover_session("session-1").unwrap();
    assert_eq!(report.status, RecoveryStatus::Completed);
    assert_eq!(report.recovered_commits, 3);
}

#[test]
fn token_json_carries_the_wire_field_names() {
    let dir = TempDir::new().unwrap();
    let committer = committer_at(&dir.path().join("ledger.db"));

    let token = committer
        .commit_white("session-1", &sample_audit("R1"), &sample_delta(&[(3, 1), (5, 1)]))
        .unwrap();
    let json = serde_json::to_value(&token).unwrap();

    assert_eq!(json["schemaVersion"], 1);
    assert_eq!(json["sessionId"], "session-1");
    assert_eq!(json["sessionSeq"], 1);
    assert!(json["commit_sha256"].as_str().unwrap().len() == 64);
    assert!(json["ts_monotonic_ms"].is_u64());
}

#[test]
fn rejected_commits_leave_no_partial_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    let committer = committer_at(&path);

    committer
        .commit_white("session-1", &sample_audit("R1"), &sample_delta(&[(1, 1)]))
        .unwrap();

    let err = committer
        .commit_white("bad id!", &sample_audit("R1"), &sample_delta(&[]))
        .unwrap_err();
    assert!(matches!(err, CommitError::InvalidSessionId(_)));

    // A later-stage rejection against the live session: the payload cap
    // trips after validation passes but before anything is written
    let mut oversized = sample_audit("R2");
    oversized.decision_path_digest = "x".repeat(2 * 1024 * 1024);
    let err = committer
        .commit_white("session-1", &oversized, &sample_delta(&[]))
        .unwrap_err();
    assert!(matches!(err, CommitError::PayloadTooLarge { .. }));

    // Exactly the one accepted row exists, under any session id
    let conn = rusqlite::Connection::open(&path).unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM commits", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    let report = committer.recover_session("session-1").unwrap();
    assert_eq!(report.recovered_commits, 1);
}
