//! Concurrent committers against one store file

use crate::prelude::*;
use std::collections::BTreeSet;
use tempfile::TempDir;
use wl_engine::RecoveryStatus;

#[test]
fn fifty_concurrent_commits_produce_a_contiguous_chain() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");

    // Prime the store file so threads race on commits, not bootstrap
    drop(committer_at(&path));

    let mut seqs: Vec<u64> = Vec::new();
    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for worker in 0..50u32 {
            let path = path.clone();
            handles.push(scope.spawn(move || {
                // Each worker owns its connection, as a separate process would
                let committer = committer_at(&path);
                let token = committer
                    .commit_white(
                        "session-1",
                        &sample_audit(&format!("R{worker}")),
                        &sample_delta(&[(worker, 2)]),
                    )
                    .unwrap();
                token.session_seq
            }));
        }
        for handle in handles {
            seqs.push(handle.join().unwrap());
        }
    });

    // Every caller succeeded exactly once with a distinct sequence, and
    // together they cover 1..=50 with no gaps
    let distinct: BTreeSet<u64> = seqs.iter().copied().collect();
    assert_eq!(distinct.len(), 50);
    assert_eq!(distinct, (1..=50).collect::<BTreeSet<u64>>());

    // The chain itself validates end to end
    let committer = committer_at(&path);
    let report = committer.recover_session("session-1").unwrap();
    assert_eq!(report.status, RecoveryStatus::Completed);
    assert_eq!(report.recovered_commits, 50);
    let grid = report.coverage_grid.unwrap();
    assert_eq!(grid.covered_cells(), 50);
}

#[test]
fn interleaved_sessions_do_not_share_sequence_space() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    drop(committer_at(&path));

    std::thread::scope(|scope| {
        for session in ["a", "b"] {
            let path = &path;
            scope.spawn(move || {
                let committer = committer_at(path);
                for i in 0..10u32 {
                    committer
                        .commit_white(session, &sample_audit("R1"), &sample_delta(&[(i, 1)]))
                        .unwrap();
                }
            });
        }
    });

    let committer = committer_at(&path);
    for session in ["a", "b"] {
        let report = committer.recover_session(session).unwrap();
        assert_eq!(report.status, RecoveryStatus::Completed);
        assert_eq!(report.recovered_commits, 10);
    }
}
