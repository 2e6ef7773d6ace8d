// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation limits for the commit log.
//!
//! These caps bound every input the ledger accepts. They exist to keep a
//! misbehaving producer from writing unbounded rows, and to give recovery
//! a hard ceiling on how much it will scan.

/// Size and count caps enforced across the codec, store, and recovery.
#[derive(Debug, Clone)]
pub struct LedgerLimits {
    /// Maximum number of cell changes in a single coverage delta
    pub max_delta_entries: usize,
    /// Maximum valid cell index in a coverage delta
    pub max_cell_index: u32,
    /// Maximum encoded payload size (audit or delta), in bytes
    pub max_payload_bytes: usize,
    /// Maximum commits recovery will scan for one session
    pub max_session_commits: usize,
}

impl Default for LedgerLimits {
    fn default() -> Self {
        Self {
            max_delta_entries: 10_000,
            max_cell_index: 1 << 20,
            max_payload_bytes: 1024 * 1024, // 1MB
            max_session_commits: 100_000,
        }
    }
}

impl LedgerLimits {
    /// Create limits suitable for testing (lower values).
    pub fn for_testing() -> Self {
        Self {
            max_delta_entries: 16,
            max_cell_index: 1024,
            max_payload_bytes: 4096,
            max_session_commits: 8,
        }
    }
}

#[cfg(test)]
#[path = "limits_tests.rs"]
mod tests;
