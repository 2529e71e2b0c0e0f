//! Debug and operational status surface.

use std::time::Duration;

use crate::grid::PlayerId;

/// Per-owner cell-state counts from the working grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerStateCounts {
    pub owner: PlayerId,
    pub unexplored: usize,
    pub explored: usize,
    pub visible: usize,
}

/// Snapshot of the subsystem's health for diagnostics and tuning.
#[derive(Debug, Clone, Default)]
pub struct VisionStatus {
    /// Whether a world mapping is installed (sweeps run at all).
    pub configured: bool,
    pub source_count: usize,
    pub grid_width: u32,
    pub grid_height: u32,
    /// Completed sweeps since initialization.
    pub pass: u64,
    /// Wall-clock span of the last completed sweep, first step to commit.
    pub last_sweep_duration: Option<Duration>,
    /// Cells tested and rewritten by the last completed sweep.
    pub last_sweep_cells: usize,
    /// A sweep is currently carried across update calls by the cell cap.
    pub sweep_in_flight: bool,
    pub owners: Vec<OwnerStateCounts>,
}
