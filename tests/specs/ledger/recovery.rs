//! Recovery after a simulated crash

use crate::prelude::*;
use tempfile::TempDir;
use wl_core::{CellState, LedgerLimits, SystemClock};
use wl_engine::{CommitterConfig, RecoveryStatus, WhiteCommitter};
use wl_storage::QualityStore;

#[test]
fn recovery_rebuilds_the_coverage_grid_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");

    {
        let committer = committer_at(&path);
        // Cell 3 goes partial, then covered; cell 9 stays partial
        committer
            .commit_white("s", &sample_audit("R1"), &sample_delta(&[(3, 1), (9, 1)]))
            .unwrap();
        committer
            .commit_white("s", &sample_audit("R2"), &sample_delta(&[(3, 2)]))
            .unwrap();
    }

    // "Crash": the writing process is gone, a new one recovers
    let committer = committer_at(&path);
    let report = committer.recover_session("s").unwrap();

    assert_eq!(report.status, RecoveryStatus::Completed);
    assert_eq!(report.recovered_commits, 2);
    let grid = report.coverage_grid.unwrap();
    assert_eq!(grid.state(3), CellState::Covered);
    assert_eq!(grid.state(9), CellState::Partial);
    assert_eq!(grid.tracked_cells(), 2);
}

#[test]
fn oversized_sessions_report_excessive_commits_without_conviction() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");

    let mut limits = LedgerLimits::default();
    limits.max_session_commits = 3;
    let store = QualityStore::open(&path, limits).unwrap();
    let committer =
        WhiteCommitter::with_config(store, CommitterConfig::default(), SystemClock::new());

    for i in 0..4u32 {
        committer
            .commit_white("s", &sample_audit("R1"), &sample_delta(&[(i, 1)]))
            .unwrap();
    }

    let report = committer.recover_session("s").unwrap();
    assert_eq!(report.status, RecoveryStatus::ExcessiveCommits);
    assert_eq!(report.recovered_commits, 0);

    // Not a conviction: commits continue to be accepted
    let token = committer
        .commit_white("s", &sample_audit("R1"), &sample_delta(&[]))
        .unwrap();
    assert_eq!(token.session_seq, 5);
}
