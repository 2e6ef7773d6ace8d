//! wl-core: Core library for the whiteledger commit log
//!
//! This crate provides:
//! - Canonical audit-record encoding (stable bytes for hashing)
//! - The binary coverage-delta codec
//! - SHA-256 hash-chain primitives
//! - The commit/token data model and coverage grid
//! - Validation limits shared by the store and recovery

pub mod audit;
pub mod clock;
pub mod commit;
pub mod delta;
pub mod grid;
pub mod hash;
pub mod limits;

// Re-exports
pub use audit::{AuditError, AuditRecord};
pub use clock::{Clock, FakeClock, SystemClock};
pub use commit::{
    validate_session_id, CommitRecord, DurableToken, SessionIdError, MAX_SESSION_ID_BYTES,
    SCHEMA_VERSION,
};
pub use delta::{CellChange, CellState, CoverageDelta, DeltaError};
pub use grid::CoverageGrid;
pub use hash::{chain_commit_sha256, is_sha256_hex, sha256_hex, GENESIS_SHA256, SHA256_HEX_LEN};
pub use limits::LedgerLimits;
