//! Read-only query surface for consumers.
//!
//! [`VisionQuery`] is cheap to clone and is the only way overlays and entity
//! code read visibility. Queries resolve against the snapshots published at
//! sweep commits; they never block on the aggregator and never trigger a
//! recomputation. Positions outside world bounds and owners without a grid
//! resolve to `Unexplored`; asking about an off-map spawn point is a normal
//! occurrence, not an error.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use glam::Vec2;

use crate::coords::WorldConfig;
use crate::grid::{CellState, PlayerId, SharedSnapshot};

/// State shared between the service (single writer) and every query handle
/// (readers). Locks are held only to swap or clone `Arc`s.
#[derive(Debug, Default)]
pub(crate) struct SharedView {
    world: RwLock<Option<Arc<WorldConfig>>>,
    snapshots: RwLock<HashMap<PlayerId, SharedSnapshot>>,
}

impl SharedView {
    pub fn set_world(&self, world: Option<Arc<WorldConfig>>) {
        *self.world.write().expect("world lock poisoned") = world;
    }

    pub fn world(&self) -> Option<Arc<WorldConfig>> {
        self.world.read().expect("world lock poisoned").clone()
    }

    pub fn publish(&self, snapshot: SharedSnapshot) {
        self.snapshots
            .write()
            .expect("snapshot lock poisoned")
            .insert(snapshot.owner, snapshot);
    }

    pub fn snapshot(&self, owner: PlayerId) -> Option<SharedSnapshot> {
        self.snapshots
            .read()
            .expect("snapshot lock poisoned")
            .get(&owner)
            .cloned()
    }

    pub fn clear(&self) {
        self.snapshots
            .write()
            .expect("snapshot lock poisoned")
            .clear();
    }
}

/// Cloneable read facade handed to every consumer.
#[derive(Debug, Clone)]
pub struct VisionQuery {
    shared: Arc<SharedView>,
}

impl VisionQuery {
    pub(crate) fn new(shared: Arc<SharedView>) -> Self {
        Self { shared }
    }

    /// The canonical world mapping, shared with the aggregator. `None` until
    /// the service has been initialized.
    pub fn world_config(&self) -> Option<Arc<WorldConfig>> {
        self.shared.world()
    }

    /// Visibility state of the cell containing a world position.
    pub fn state_at(&self, owner: PlayerId, world_pos: Vec2) -> CellState {
        let Some(world) = self.shared.world() else {
            return CellState::Unexplored;
        };
        if !world.contains(world_pos) {
            return CellState::Unexplored;
        }
        let Some(snapshot) = self.shared.snapshot(owner) else {
            return CellState::Unexplored;
        };
        let cell = world.world_to_cell(world_pos);
        snapshot.state_at(cell.x, cell.y)
    }

    pub fn is_visible(&self, owner: PlayerId, world_pos: Vec2) -> bool {
        self.state_at(owner, world_pos) == CellState::Visible
    }

    /// Whether an entity standing at `entity_pos` is currently seen by
    /// `owner`. Sugar over `state_at == Visible`.
    pub fn is_entity_visible(&self, owner: PlayerId, entity_pos: Vec2) -> bool {
        self.is_visible(owner, entity_pos)
    }

    /// Bulk read view for overlay rendering that wants to avoid per-point
    /// call overhead. `None` until the owner's first sweep commit.
    pub fn snapshot(&self, owner: PlayerId) -> Option<SharedSnapshot> {
        self.shared.snapshot(owner)
    }
}
