// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! wl-engine: commit orchestration and crash recovery for the
//! white-commit ledger

pub mod committer;
pub mod config;
pub mod error;
pub mod recovery;

pub use committer::WhiteCommitter;
pub use config::CommitterConfig;
pub use error::{CommitError, RecoveryError};
pub use recovery::{recover_session, RecoveryReport, RecoveryStatus};
