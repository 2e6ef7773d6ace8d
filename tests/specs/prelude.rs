//! Shared helpers for ledger specs

use std::collections::BTreeMap;
use std::path::Path;
use wl_core::{AuditRecord, CoverageDelta, LedgerLimits, SystemClock};
use wl_engine::WhiteCommitter;
use wl_storage::QualityStore;

/// Open a committer over the store file at `path`.
pub fn committer_at(path: &Path) -> WhiteCommitter<SystemClock> {
    let store = QualityStore::open(path, LedgerLimits::default()).unwrap();
    WhiteCommitter::new(store)
}

pub fn sample_audit(rule: &str) -> AuditRecord {
    let mut metrics = BTreeMap::new();
    metrics.insert("sharpness".to_string(), 0.92);
    metrics.insert("exposure".to_string(), 1.0);
    AuditRecord {
        rule_ids: vec![rule.to_string()],
        metric_snapshot: metrics,
        decision_path_digest: "d1".to_string(),
        threshold_version: "1.0".to_string(),
        build_git_sha: "abc123".to_string(),
    }
}

pub fn sample_delta(pairs: &[(u32, u8)]) -> CoverageDelta {
    CoverageDelta::from_pairs(pairs, &LedgerLimits::default()).unwrap()
}

/// Flip one hex character of a digest string.
pub fn flip_hex_char(digest: &str) -> String {
    let mut chars: Vec<char> = digest.chars().collect();
    chars[0] = if chars[0] == '0' { '1' } else { '0' };
    chars.into_iter().collect()
}
