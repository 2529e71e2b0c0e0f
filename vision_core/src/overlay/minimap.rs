//! Minimap fog overlay.
//!
//! Produces a coarse RGBA8 texture the minimap composites over its terrain
//! view. Texels map onto grid cells through the shared world mapping, so a
//! minimap texture of any resolution stays aligned with the world fog. The
//! texture refreshes on the aggregation cadence (pass stamp), not every
//! rendered frame.

use std::sync::Arc;

use glam::Vec2;

use crate::coords::WorldConfig;
use crate::grid::{CellState, GridSnapshot};

/// RGBA written per texel, by cell state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FogColors {
    pub visible: [u8; 4],
    pub explored: [u8; 4],
    pub unexplored: [u8; 4],
}

impl Default for FogColors {
    fn default() -> Self {
        Self {
            // Transparent over currently-seen ground, a half-strength veil
            // over remembered ground, opaque over the unknown.
            visible: [0, 0, 0, 0],
            explored: [0, 0, 0, 128],
            unexplored: [0, 0, 0, 255],
        }
    }
}

pub struct MinimapFog {
    world: Arc<WorldConfig>,
    width: u32,
    height: u32,
    texels: Vec<u8>,
    colors: FogColors,
    pass: Option<u64>,
}

impl MinimapFog {
    /// Texture sized 1:1 with the grid.
    pub fn new(world: Arc<WorldConfig>) -> Self {
        let (w, h) = (world.grid_width(), world.grid_height());
        Self::with_size(world, w, h)
    }

    /// Texture of an arbitrary resolution; texels resolve to cells through
    /// the shared mapping.
    pub fn with_size(world: Arc<WorldConfig>, width: u32, height: u32) -> Self {
        let colors = FogColors::default();
        let mut texels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            texels.extend_from_slice(&colors.unexplored);
        }
        Self {
            world,
            width,
            height,
            texels,
            colors,
            pass: None,
        }
    }

    pub fn with_colors(mut self, colors: FogColors) -> Self {
        self.colors = colors;
        self
    }

    /// Rebuild the texture from a snapshot. Returns false without touching
    /// the texture when the snapshot's pass has already been applied, which
    /// keeps refresh on the aggregation cadence even when called per frame.
    pub fn refresh(&mut self, snapshot: &GridSnapshot) -> bool {
        if self.pass == Some(snapshot.pass) {
            return false;
        }

        let min = self.world.bounds_min();
        let extent = self.world.bounds_max() - min;
        for ty in 0..self.height {
            for tx in 0..self.width {
                let u = (tx as f32 + 0.5) / self.width as f32;
                let v = (ty as f32 + 0.5) / self.height as f32;
                let world_pos = min + Vec2::new(u, v) * extent;
                let cell = self.world.world_to_cell(world_pos);
                let rgba = match snapshot.state_at(cell.x, cell.y) {
                    CellState::Visible => self.colors.visible,
                    CellState::Explored => self.colors.explored,
                    CellState::Unexplored => self.colors.unexplored,
                };
                let idx = ((ty * self.width + tx) * 4) as usize;
                self.texels[idx..idx + 4].copy_from_slice(&rgba);
            }
        }
        self.pass = Some(snapshot.pass);
        true
    }

    /// Raw RGBA8 texel data, row-major, for texture upload.
    pub fn data(&self) -> &[u8] {
        &self.texels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pass(&self) -> Option<u64> {
        self.pass
    }
}
