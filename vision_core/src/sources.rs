//! Vision source registry.
//!
//! Every unit or building that emits vision registers one [`VisionSource`]
//! here on spawn and removes it on despawn. Registration returns an opaque
//! [`SourceId`] handle the remaining operations are keyed by; the entity
//! binding exists so lifecycle notifications (which only know the entity)
//! can address their own source, and so a duplicated spawn notification
//! resolves to the existing handle instead of doubling a vision ring.
//! Position updates from moving entities are cheap field writes observed by
//! the next aggregation sweep.

use std::collections::HashMap;

use glam::Vec2;

use crate::grid::PlayerId;

/// Identifies the external entity a source is bound to. Allocated by the
/// unit/building lifecycle code, opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// Opaque handle to a registered vision source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

/// A circular area an entity currently observes.
#[derive(Debug, Clone, Copy)]
pub struct VisionSource {
    pub owner: PlayerId,
    pub position: Vec2,
    pub radius: f32,
    /// Inactive sources contribute nothing but stay registered, e.g. a
    /// stealthed unit with vision disabled.
    pub active: bool,
}

impl VisionSource {
    pub fn new(owner: PlayerId, position: Vec2, radius: f32) -> Self {
        Self {
            owner,
            position,
            radius,
            active: true,
        }
    }
}

#[derive(Debug)]
struct Registered {
    entity: EntityId,
    source: VisionSource,
}

/// Registry of active vision emitters.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceId, Registered>,
    bindings: HashMap<EntityId, SourceId>,
    next_id: u64,
}

impl SourceRegistry {
    /// Register a source for an entity. Registering an entity that already
    /// has a source is a no-op returning the existing handle, so re-entrant
    /// spawn notifications cannot double a vision ring.
    pub fn register(&mut self, entity: EntityId, source: VisionSource) -> SourceId {
        if let Some(&existing) = self.bindings.get(&entity) {
            return existing;
        }
        self.next_id += 1;
        let id = SourceId(self.next_id);
        self.sources.insert(id, Registered { entity, source });
        self.bindings.insert(entity, id);
        id
    }

    /// Remove a source by handle. Idempotent; returns whether a source was
    /// actually removed. Once this returns, the source contributes to no
    /// subsequent sweep, including one already in flight.
    pub fn unregister(&mut self, id: SourceId) -> bool {
        match self.sources.remove(&id) {
            Some(record) => {
                self.bindings.remove(&record.entity);
                true
            }
            None => false,
        }
    }

    pub fn update_position(&mut self, id: SourceId, position: Vec2) -> bool {
        match self.sources.get_mut(&id) {
            Some(record) => {
                record.source.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_active(&mut self, id: SourceId, active: bool) -> bool {
        match self.sources.get_mut(&id) {
            Some(record) => {
                record.source.active = active;
                true
            }
            None => false,
        }
    }

    /// Handle bound to an entity, if it still has a source.
    pub fn handle_of(&self, entity: EntityId) -> Option<SourceId> {
        self.bindings.get(&entity).copied()
    }

    pub fn get(&self, id: SourceId) -> Option<&VisionSource> {
        self.sources.get(&id).map(|record| &record.source)
    }

    /// Iterate over every registered source.
    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &VisionSource)> {
        self.sources
            .iter()
            .map(|(&id, record)| (id, &record.source))
    }

    /// Owner ids that currently have at least one source registered.
    pub fn owners(&self) -> Vec<PlayerId> {
        let mut owners: Vec<PlayerId> = self
            .sources
            .values()
            .map(|record| record.source.owner)
            .collect();
        owners.sort_by_key(|o| o.0);
        owners.dedup();
        owners
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Drop every source and binding. Used by the full service reset.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.bindings.clear();
    }
}
