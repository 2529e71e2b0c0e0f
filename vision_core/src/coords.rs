//! World-space to grid-space mapping.
//!
//! [`WorldConfig`] is the one canonical definition of world bounds and cell
//! size. Every component that maps between world positions, cell indices and
//! normalized map-space must go through the same shared instance; nothing in
//! the crate recomputes bounds on its own. The service constructs it once at
//! map load and hands out `Arc<WorldConfig>` clones.

use glam::{UVec2, Vec2};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldConfigError {
    #[error("world bounds are degenerate: min {min:?} must be strictly below max {max:?} on both axes")]
    InvalidBounds { min: Vec2, max: Vec2 },
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
}

/// Canonical world bounds and cell layout, immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    bounds_min: Vec2,
    bounds_max: Vec2,
    cell_size: f32,
    grid_width: u32,
    grid_height: u32,
}

impl WorldConfig {
    pub fn new(bounds_min: Vec2, bounds_max: Vec2, cell_size: f32) -> Result<Self, WorldConfigError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(WorldConfigError::InvalidCellSize(cell_size));
        }
        if bounds_max.x <= bounds_min.x || bounds_max.y <= bounds_min.y {
            return Err(WorldConfigError::InvalidBounds {
                min: bounds_min,
                max: bounds_max,
            });
        }
        let extent = bounds_max - bounds_min;
        let grid_width = (extent.x / cell_size).ceil().max(1.0) as u32;
        let grid_height = (extent.y / cell_size).ceil().max(1.0) as u32;
        Ok(Self {
            bounds_min,
            bounds_max,
            cell_size,
            grid_width,
            grid_height,
        })
    }

    pub fn bounds_min(&self) -> Vec2 {
        self.bounds_min
    }

    pub fn bounds_max(&self) -> Vec2 {
        self.bounds_max
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    pub fn grid_height(&self) -> u32 {
        self.grid_height
    }

    pub fn cell_count(&self) -> usize {
        (self.grid_width * self.grid_height) as usize
    }

    /// Whether a world position lies inside the configured bounds.
    #[inline]
    pub fn contains(&self, world: Vec2) -> bool {
        world.x >= self.bounds_min.x
            && world.x <= self.bounds_max.x
            && world.y >= self.bounds_min.y
            && world.y <= self.bounds_max.y
    }

    /// Map a world position to grid cell coordinates, clamped into
    /// `[0, grid_width) x [0, grid_height)`.
    #[inline]
    pub fn world_to_cell(&self, world: Vec2) -> UVec2 {
        let rel = world - self.bounds_min;
        let x = (rel.x / self.cell_size).floor() as i64;
        let z = (rel.y / self.cell_size).floor() as i64;
        UVec2::new(
            x.clamp(0, self.grid_width as i64 - 1) as u32,
            z.clamp(0, self.grid_height as i64 - 1) as u32,
        )
    }

    /// World position of a cell's center.
    #[inline]
    pub fn cell_to_world(&self, x: u32, z: u32) -> Vec2 {
        self.bounds_min
            + Vec2::new(
                (x as f32 + 0.5) * self.cell_size,
                (z as f32 + 0.5) * self.cell_size,
            )
    }

    /// Map a world position into normalized `[0, 1]^2` map-space, for
    /// texture and minimap sampling. Out-of-bounds positions clamp to the
    /// nearest edge.
    #[inline]
    pub fn world_to_normalized(&self, world: Vec2) -> Vec2 {
        let extent = self.bounds_max - self.bounds_min;
        ((world - self.bounds_min) / extent).clamp(Vec2::ZERO, Vec2::ONE)
    }

    /// Row-major index of a cell, bounds-checked.
    #[inline]
    pub fn cell_index(&self, x: u32, z: u32) -> Option<usize> {
        if x < self.grid_width && z < self.grid_height {
            Some((z * self.grid_width + x) as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WorldConfig {
        WorldConfig::new(Vec2::ZERO, Vec2::new(100.0, 100.0), 10.0).unwrap()
    }

    #[test]
    fn grid_dimensions_derive_from_bounds() {
        let cfg = config();
        assert_eq!(cfg.grid_width(), 10);
        assert_eq!(cfg.grid_height(), 10);
        assert_eq!(cfg.cell_count(), 100);

        // Non-integral extents round the grid up so the map is fully covered.
        let cfg = WorldConfig::new(Vec2::ZERO, Vec2::new(25.0, 17.0), 10.0).unwrap();
        assert_eq!(cfg.grid_width(), 3);
        assert_eq!(cfg.grid_height(), 2);
    }

    #[test]
    fn degenerate_bounds_rejected() {
        assert!(WorldConfig::new(Vec2::new(5.0, 0.0), Vec2::new(5.0, 10.0), 1.0).is_err());
        assert!(WorldConfig::new(Vec2::ZERO, Vec2::new(-1.0, 10.0), 1.0).is_err());
        assert!(WorldConfig::new(Vec2::ZERO, Vec2::ONE, 0.0).is_err());
        assert!(WorldConfig::new(Vec2::ZERO, Vec2::ONE, f32::NAN).is_err());
    }

    #[test]
    fn world_to_cell_clamps() {
        let cfg = config();
        assert_eq!(cfg.world_to_cell(Vec2::new(5.0, 5.0)), UVec2::new(0, 0));
        assert_eq!(cfg.world_to_cell(Vec2::new(95.0, 95.0)), UVec2::new(9, 9));
        // Positions outside the bounds clamp to edge cells instead of erroring.
        assert_eq!(cfg.world_to_cell(Vec2::new(-50.0, 5.0)), UVec2::new(0, 0));
        assert_eq!(
            cfg.world_to_cell(Vec2::new(1000.0, 1000.0)),
            UVec2::new(9, 9)
        );
    }

    #[test]
    fn cell_to_world_returns_center() {
        let cfg = config();
        assert_eq!(cfg.cell_to_world(0, 0), Vec2::new(5.0, 5.0));
        assert_eq!(cfg.cell_to_world(9, 9), Vec2::new(95.0, 95.0));
    }

    #[test]
    fn round_trip_stays_within_one_cell() {
        let cfg = config();
        for &(x, y) in &[
            (0.0, 0.0),
            (3.7, 42.1),
            (50.0, 50.0),
            (99.9, 99.9),
            (12.0, 88.5),
        ] {
            let p = Vec2::new(x, y);
            let cell = cfg.world_to_cell(p);
            let back = cfg.cell_to_world(cell.x, cell.y);
            assert!(
                (back - p).length() <= cfg.cell_size(),
                "round trip of {p:?} landed {back:?}"
            );
        }
    }

    #[test]
    fn normalized_mapping() {
        let cfg = config();
        assert_eq!(cfg.world_to_normalized(Vec2::ZERO), Vec2::ZERO);
        assert_eq!(
            cfg.world_to_normalized(Vec2::new(100.0, 100.0)),
            Vec2::ONE
        );
        assert_eq!(
            cfg.world_to_normalized(Vec2::new(50.0, 25.0)),
            Vec2::new(0.5, 0.25)
        );
        // Clamped, never outside the unit square.
        assert_eq!(cfg.world_to_normalized(Vec2::new(-10.0, 500.0)), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn contains_is_inclusive_at_edges() {
        let cfg = config();
        assert!(cfg.contains(Vec2::ZERO));
        assert!(cfg.contains(Vec2::new(100.0, 100.0)));
        assert!(!cfg.contains(Vec2::new(100.1, 50.0)));
        assert!(!cfg.contains(Vec2::new(50.0, -0.1)));
    }
}
