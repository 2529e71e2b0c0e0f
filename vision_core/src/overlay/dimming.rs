//! World-view dimming overlay.
//!
//! Maintains a per-cell brightness buffer the renderer multiplies into the
//! world pass: full brightness where Visible, partial where Explored, dark
//! where Unexplored. Per-pixel lookups reconstruct the pixel's world
//! position and sample through the shared mapping, so fog, markers and
//! click targets cannot drift apart.

use std::sync::Arc;

use glam::Vec2;

use crate::config::BrightnessLevels;
use crate::coords::WorldConfig;
use crate::grid::{CellState, GridSnapshot};

pub struct DimmingOverlay {
    world: Arc<WorldConfig>,
    levels: BrightnessLevels,
    brightness: Vec<f32>,
    pass: Option<u64>,
}

impl DimmingOverlay {
    pub fn new(world: Arc<WorldConfig>, levels: BrightnessLevels) -> Self {
        let brightness = vec![levels.unexplored; world.cell_count()];
        Self {
            world,
            levels,
            brightness,
            pass: None,
        }
    }

    /// Rebuild the buffer from a snapshot. Returns false without touching
    /// the buffer when the snapshot is the pass already applied.
    pub fn refresh(&mut self, snapshot: &GridSnapshot) -> bool {
        if self.pass == Some(snapshot.pass) {
            return false;
        }
        debug_assert_eq!(snapshot.cells().len(), self.brightness.len());
        for (slot, &state) in self.brightness.iter_mut().zip(snapshot.cells()) {
            *slot = match state {
                CellState::Visible => self.levels.visible,
                CellState::Explored => self.levels.explored,
                CellState::Unexplored => self.levels.unexplored,
            };
        }
        self.pass = Some(snapshot.pass);
        true
    }

    /// Brightness of a cell; out-of-range reads as unexplored.
    pub fn brightness_at(&self, x: u32, z: u32) -> f32 {
        self.world
            .cell_index(x, z)
            .map(|idx| self.brightness[idx])
            .unwrap_or(self.levels.unexplored)
    }

    /// Brightness at a world position, for per-pixel sampling.
    pub fn sample_world(&self, world_pos: Vec2) -> f32 {
        if !self.world.contains(world_pos) {
            return self.levels.unexplored;
        }
        let cell = self.world.world_to_cell(world_pos);
        self.brightness_at(cell.x, cell.y)
    }

    /// The whole buffer, row-major, for upload as a shader texture.
    pub fn buffer(&self) -> &[f32] {
        &self.brightness
    }

    /// Pass stamp of the applied snapshot, if any.
    pub fn pass(&self) -> Option<u64> {
        self.pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{PlayerId, VisibilityGrid};

    fn world() -> Arc<WorldConfig> {
        Arc::new(WorldConfig::new(Vec2::ZERO, Vec2::new(100.0, 100.0), 10.0).unwrap())
    }

    fn snapshot_with_states() -> GridSnapshot {
        let mut grid = VisibilityGrid::new(PlayerId(0), 10, 10);
        let mut covered = vec![false; 100];
        covered[0] = true; // (0,0) -> Visible
        covered[1] = true; // (1,0) -> later Explored
        grid.apply_coverage(&covered);
        covered[1] = false;
        grid.apply_coverage(&covered);
        grid.snapshot(1)
    }

    #[test]
    fn refresh_applies_levels() {
        let mut overlay = DimmingOverlay::new(world(), BrightnessLevels::default());
        assert!(overlay.refresh(&snapshot_with_states()));

        assert_eq!(overlay.brightness_at(0, 0), 1.0);
        assert_eq!(overlay.brightness_at(1, 0), 0.45);
        assert_eq!(overlay.brightness_at(5, 5), 0.0);
    }

    #[test]
    fn refresh_skips_same_pass() {
        let mut overlay = DimmingOverlay::new(world(), BrightnessLevels::default());
        let snap = snapshot_with_states();
        assert!(overlay.refresh(&snap));
        assert!(!overlay.refresh(&snap));
        assert_eq!(overlay.pass(), Some(1));
    }

    #[test]
    fn world_sampling_matches_cells() {
        let mut overlay = DimmingOverlay::new(world(), BrightnessLevels::default());
        overlay.refresh(&snapshot_with_states());

        assert_eq!(overlay.sample_world(Vec2::new(5.0, 5.0)), 1.0);
        assert_eq!(overlay.sample_world(Vec2::new(15.0, 5.0)), 0.45);
        assert_eq!(overlay.sample_world(Vec2::new(55.0, 55.0)), 0.0);
        // Off-map pixels are fully dark, not an error.
        assert_eq!(overlay.sample_world(Vec2::new(-10.0, 5.0)), 0.0);
    }
}
