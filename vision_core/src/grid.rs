//! Per-player visibility grids.
//!
//! Each player (owner) gets one tri-state grid covering the configured world
//! bounds:
//! - Unexplored (0): never seen
//! - Explored (1): previously seen but not currently
//! - Visible (2): currently seen
//!
//! Grids are owned and mutated exclusively by the aggregation sweep; readers
//! only ever see [`GridSnapshot`] values published at commit time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use glam::UVec2;

/// Identifies the player/faction a vision source and its grid belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility state of a single cell from one player's perspective.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Unexplored = 0,
    Explored = 1,
    Visible = 2,
}

impl CellState {
    /// Convert to u8 for raster export.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Convert from u8, defaulting to Unexplored for invalid values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Explored,
            2 => Self::Visible,
            _ => Self::Unexplored,
        }
    }
}

/// One player's visibility grid over the whole world.
#[derive(Debug, Clone)]
pub struct VisibilityGrid {
    pub owner: PlayerId,
    pub width: u32,
    pub height: u32,
    cells: Vec<CellState>,
}

impl VisibilityGrid {
    /// Create a grid with every cell unexplored.
    pub fn new(owner: PlayerId, width: u32, height: u32) -> Self {
        let total = (width * height) as usize;
        Self {
            owner,
            width,
            height,
            cells: vec![CellState::default(); total],
        }
    }

    #[inline]
    fn index(&self, x: u32, z: u32) -> Option<usize> {
        if x < self.width && z < self.height {
            Some((z * self.width + x) as usize)
        } else {
            None
        }
    }

    /// Visibility state of a cell; out-of-range coordinates read as Unexplored.
    #[inline]
    pub fn state_at(&self, x: u32, z: u32) -> CellState {
        self.index(x, z)
            .and_then(|idx| self.cells.get(idx).copied())
            .unwrap_or(CellState::Unexplored)
    }

    /// Apply one sweep's coverage mask: covered cells become Visible, cells
    /// that were Visible but are no longer covered demote to Explored, and
    /// everything else keeps its state. Visible never reverts to Unexplored.
    ///
    /// Returns `(promoted, demoted)` cell counts.
    pub fn apply_coverage(&mut self, covered: &[bool]) -> (usize, usize) {
        debug_assert_eq!(covered.len(), self.cells.len());
        let mut promoted = 0;
        let mut demoted = 0;
        for (cell, &is_covered) in self.cells.iter_mut().zip(covered) {
            if is_covered {
                if *cell != CellState::Visible {
                    promoted += 1;
                }
                *cell = CellState::Visible;
            } else if *cell == CellState::Visible {
                *cell = CellState::Explored;
                demoted += 1;
            }
        }
        (promoted, demoted)
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter_cells(&self) -> impl Iterator<Item = (UVec2, CellState)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(idx, &state)| {
            let x = (idx as u32) % width;
            let z = (idx as u32) / width;
            (UVec2::new(x, z), state)
        })
    }

    /// Export states as a flat byte array (row-major).
    pub fn to_byte_raster(&self) -> Vec<u8> {
        self.cells.iter().map(|s| s.as_u8()).collect()
    }

    /// Count cells by state: `(unexplored, explored, visible)`.
    pub fn count_by_state(&self) -> (usize, usize, usize) {
        let mut unexplored = 0;
        let mut explored = 0;
        let mut visible = 0;
        for state in &self.cells {
            match state {
                CellState::Unexplored => unexplored += 1,
                CellState::Explored => explored += 1,
                CellState::Visible => visible += 1,
            }
        }
        (unexplored, explored, visible)
    }

    /// Capture an immutable snapshot of the grid, stamped with the sweep
    /// counter it was produced by.
    pub fn snapshot(&self, pass: u64) -> GridSnapshot {
        GridSnapshot {
            owner: self.owner,
            width: self.width,
            height: self.height,
            pass,
            cells: self.cells.clone(),
        }
    }
}

/// Immutable, complete copy of one player's grid from the end of a sweep.
///
/// Published behind an [`Arc`] so readers hold on to a self-consistent view
/// while the working grid is being rewritten.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    pub owner: PlayerId,
    pub width: u32,
    pub height: u32,
    /// Sweep counter at publication; consumers use this to detect staleness.
    pub pass: u64,
    cells: Vec<CellState>,
}

impl GridSnapshot {
    /// Visibility state of a cell; out-of-range coordinates read as Unexplored.
    #[inline]
    pub fn state_at(&self, x: u32, z: u32) -> CellState {
        if x < self.width && z < self.height {
            self.cells[(z * self.width + x) as usize]
        } else {
            CellState::Unexplored
        }
    }

    /// All cell states, row-major.
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Export states as a flat byte array (row-major), for texture upload.
    pub fn to_byte_raster(&self) -> Vec<u8> {
        self.cells.iter().map(|s| s.as_u8()).collect()
    }

    /// Count cells by state: `(unexplored, explored, visible)`.
    pub fn count_by_state(&self) -> (usize, usize, usize) {
        let mut unexplored = 0;
        let mut explored = 0;
        let mut visible = 0;
        for state in &self.cells {
            match state {
                CellState::Unexplored => unexplored += 1,
                CellState::Explored => explored += 1,
                CellState::Visible => visible += 1,
            }
        }
        (unexplored, explored, visible)
    }
}

/// Working set of per-owner grids, created lazily as owners appear.
#[derive(Debug, Clone, Default)]
pub struct VisionLedger {
    grids: HashMap<PlayerId, VisibilityGrid>,
}

impl VisionLedger {
    /// Ensure an owner has a grid, creating one if needed.
    pub fn ensure_owner(
        &mut self,
        owner: PlayerId,
        width: u32,
        height: u32,
    ) -> &mut VisibilityGrid {
        self.grids
            .entry(owner)
            .or_insert_with(|| VisibilityGrid::new(owner, width, height))
    }

    pub fn get(&self, owner: PlayerId) -> Option<&VisibilityGrid> {
        self.grids.get(&owner)
    }

    pub fn get_mut(&mut self, owner: PlayerId) -> Option<&mut VisibilityGrid> {
        self.grids.get_mut(&owner)
    }

    /// Iterate over all owner ids with a grid.
    pub fn owners(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.grids.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Drop every grid. Used by the full service reset at map teardown.
    pub fn clear(&mut self) {
        self.grids.clear();
    }
}

/// Shared alias used where snapshots change hands.
pub type SharedSnapshot = Arc<GridSnapshot>;
