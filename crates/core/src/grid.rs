// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derived coverage state, rebuilt by folding deltas in sequence order
//!
//! The grid has no identity of its own: it is a pure fold over the
//! coverage deltas of a session's commits and can always be rebuilt.

use crate::delta::{CellState, CoverageDelta};
use std::collections::HashMap;

/// Sparse map from cell index to coverage state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageGrid {
    cells: HashMap<u32, CellState>,
}

impl CoverageGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one delta. Later deltas overwrite earlier states per cell.
    pub fn apply_delta(&mut self, delta: &CoverageDelta) {
        for change in delta.changes() {
            if change.state == CellState::Uncovered {
                // Uncovered is the implicit default, keep the map sparse
                self.cells.remove(&change.cell_index);
            } else {
                self.cells.insert(change.cell_index, change.state);
            }
        }
    }

    /// Current state of a cell. Cells never written are uncovered.
    pub fn state(&self, cell_index: u32) -> CellState {
        self.cells
            .get(&cell_index)
            .copied()
            .unwrap_or(CellState::Uncovered)
    }

    /// Number of cells in a non-default state
    pub fn tracked_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of fully covered cells
    pub fn covered_cells(&self) -> usize {
        self.cells
            .values()
            .filter(|state| **state == CellState::Covered)
            .count()
    }

    /// Number of partially covered cells
    pub fn partial_cells(&self) -> usize {
        self.cells
            .values()
            .filter(|state| **state == CellState::Partial)
            .count()
    }
}

#[cfg(test)]
#[path = "grid_tests.rs"]
mod tests;
