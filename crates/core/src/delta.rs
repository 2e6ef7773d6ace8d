// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary coverage-delta codec
//!
//! Wire format: big-endian `u32` change count, then one record per change
//! of big-endian `u32` cell index followed by a `u8` state. Records are
//! sorted ascending by cell index and deduplicated (last write wins)
//! before encoding. Decoding re-validates every field; a truncated buffer
//! or out-of-range value is a fatal error, never silently ignored.

use crate::limits::LedgerLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in the coverage-delta codec
#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("delta too large: {count} changes exceeds maximum {max}")]
    TooLarge { count: usize, max: usize },
    #[error("invalid cell index {cell_index}: maximum is {max}")]
    InvalidCellIndex { cell_index: u32, max: u32 },
    #[error("corrupted evidence: {reason}")]
    CorruptedEvidence { reason: String },
}

/// Coverage state of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellState {
    Uncovered = 0,
    Partial = 1,
    Covered = 2,
}

impl CellState {
    /// Parse a wire-format state byte.
    pub fn from_wire(value: u8) -> Result<Self, DeltaError> {
        match value {
            0 => Ok(CellState::Uncovered),
            1 => Ok(CellState::Partial),
            2 => Ok(CellState::Covered),
            other => Err(DeltaError::CorruptedEvidence {
                reason: format!("invalid cell state value {other}"),
            }),
        }
    }

    pub fn as_wire(self) -> u8 {
        self as u8
    }
}

/// One cell transition within a coverage delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub cell_index: u32,
    pub state: CellState,
}

/// An incremental coverage update for one commit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageDelta {
    changes: Vec<CellChange>,
}

impl CoverageDelta {
    /// Build a delta from raw `(cell_index, state)` pairs.
    ///
    /// Pairs are sorted ascending by cell index and deduplicated keeping
    /// the last-seen state per cell. Limits are enforced on the raw input
    /// count, before deduplication.
    pub fn from_pairs(pairs: &[(u32, u8)], limits: &LedgerLimits) -> Result<Self, DeltaError> {
        if pairs.len() > limits.max_delta_entries {
            return Err(DeltaError::TooLarge {
                count: pairs.len(),
                max: limits.max_delta_entries,
            });
        }

        // Stable sort keeps input order among equal indices, so the last
        // occurrence per cell is still last after sorting
        let mut sorted: Vec<(u32, u8)> = pairs.to_vec();
        sorted.sort_by_key(|&(cell_index, _)| cell_index);

        let mut changes: Vec<CellChange> = Vec::with_capacity(sorted.len());
        for (cell_index, raw_state) in sorted {
            if cell_index > limits.max_cell_index {
                return Err(DeltaError::InvalidCellIndex {
                    cell_index,
                    max: limits.max_cell_index,
                });
            }
            let state = CellState::from_wire(raw_state)?;
            match changes.last_mut() {
                Some(last) if last.cell_index == cell_index => last.state = state,
                _ => changes.push(CellChange { cell_index, state }),
            }
        }

        Ok(Self { changes })
    }

    /// The normalized (sorted, deduplicated) changes.
    pub fn changes(&self) -> &[CellChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Encode to the binary wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.changes.len() * 5);
        out.extend_from_slice(&(self.changes.len() as u32).to_be_bytes());
        for change in &self.changes {
            out.extend_from_slice(&change.cell_index.to_be_bytes());
            out.push(change.state.as_wire());
        }
        out
    }

    /// Decode and re-validate a wire-format buffer.
    ///
    /// The buffer must carry exactly the declared record count, strictly
    /// ascending cell indices within limits, and valid state values.
    pub fn decode(bytes: &[u8], limits: &LedgerLimits) -> Result<Self, DeltaError> {
        if bytes.len() < 4 {
            return Err(DeltaError::CorruptedEvidence {
                reason: format!("delta header truncated: {} bytes", bytes.len()),
            });
        }
        let mut count_bytes = [0u8; 4];
        count_bytes.copy_from_slice(&bytes[..4]);
        let count = u32::from_be_bytes(count_bytes) as usize;

        if count > limits.max_delta_entries {
            return Err(DeltaError::TooLarge {
                count,
                max: limits.max_delta_entries,
            });
        }

        let body = &bytes[4..];
        let expected = count * 5;
        if body.len() != expected {
            return Err(DeltaError::CorruptedEvidence {
                reason: format!(
                    "delta body is {} bytes, expected {expected} for {count} changes",
                    body.len()
                ),
            });
        }

        let mut changes = Vec::with_capacity(count);
        let mut prev_index: Option<u32> = None;
        for record in body.chunks_exact(5) {
            let mut index_bytes = [0u8; 4];
            index_bytes.copy_from_slice(&record[..4]);
            let cell_index = u32::from_be_bytes(index_bytes);

            if cell_index > limits.max_cell_index {
                return Err(DeltaError::InvalidCellIndex {
                    cell_index,
                    max: limits.max_cell_index,
                });
            }
            if let Some(prev) = prev_index {
                if cell_index <= prev {
                    return Err(DeltaError::CorruptedEvidence {
                        reason: format!(
                            "cell index {cell_index} out of order after {prev}"
                        ),
                    });
                }
            }
            prev_index = Some(cell_index);

            let state = CellState::from_wire(record[4])?;
            changes.push(CellChange { cell_index, state });
        }

        Ok(Self { changes })
    }
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
