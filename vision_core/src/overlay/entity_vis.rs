//! Per-entity visibility decisions.
//!
//! Decides whether an entity should render (and be selectable) from the
//! viewer's perspective. The viewer's own entities are always shown; enemy
//! entities are shown when their cell is Visible, and optionally in
//! Explored depending on the entity kind's `hide_in_explored` policy:
//! buildings conventionally persist as remembered silhouettes while units
//! vanish with the fog. A cell never seen shows nothing.

use std::collections::HashMap;

use glam::Vec2;

use crate::config::VisionSettings;
use crate::grid::{CellState, PlayerId};
use crate::query::VisionQuery;

#[derive(Debug, Clone)]
pub struct EntityVisibilityFilter {
    query: VisionQuery,
    hide_in_explored: HashMap<String, bool>,
}

impl EntityVisibilityFilter {
    pub fn new(query: VisionQuery, settings: &VisionSettings) -> Self {
        Self {
            query,
            hide_in_explored: settings.hide_in_explored.clone(),
        }
    }

    /// Policy for an entity kind; unknown kinds hide unless currently seen.
    pub fn hide_in_explored_for(&self, kind: &str) -> bool {
        self.hide_in_explored.get(kind).copied().unwrap_or(true)
    }

    /// Whether `viewer` should see an entity of `kind`, owned by `owner`,
    /// standing at `position`.
    pub fn is_displayed(
        &self,
        viewer: PlayerId,
        owner: PlayerId,
        kind: &str,
        position: Vec2,
    ) -> bool {
        if viewer == owner {
            return true;
        }
        match self.query.state_at(viewer, position) {
            CellState::Visible => true,
            CellState::Explored => !self.hide_in_explored_for(kind),
            CellState::Unexplored => false,
        }
    }
}
