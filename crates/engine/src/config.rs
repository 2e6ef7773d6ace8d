// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Committer configuration

use std::time::Duration;

/// Retry and token settings for the white committer
#[derive(Debug, Clone)]
pub struct CommitterConfig {
    /// Maximum commit attempts before giving up on contention
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles each retry
    pub backoff_base: Duration,
    /// Upper bound on any single backoff sleep
    pub backoff_cap: Duration,
    /// Include audit/delta digests in returned tokens (debugging aid)
    pub include_debug_digests: bool,
}

impl Default for CommitterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(10),
            backoff_cap: Duration::from_millis(250),
            include_debug_digests: false,
        }
    }
}

impl CommitterConfig {
    /// Create a config suitable for testing (fast backoff).
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1),
            backoff_cap: Duration::from_millis(5),
            include_debug_digests: true,
        }
    }
}
