//! Typed lifecycle notifications from the unit/building subsystem.
//!
//! Spawn, despawn and move notifications arrive as fire-and-forget messages
//! on a typed channel rather than an untyped broadcast bus. The service
//! drains the channel at the start of every update, before any sweep work,
//! so "eventually observed" here means at latest the next scheduled pass.

use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec2;

use crate::grid::PlayerId;
use crate::sources::EntityId;

/// Lifecycle notification consumed by the visibility core.
#[derive(Debug, Clone, Copy)]
pub enum EntityEvent {
    Spawned {
        entity: EntityId,
        owner: PlayerId,
        position: Vec2,
        vision_radius: f32,
    },
    Destroyed {
        entity: EntityId,
    },
    Moved {
        entity: EntityId,
        position: Vec2,
    },
}

/// Cloneable sender handed to entity lifecycle code.
#[derive(Debug, Clone)]
pub struct EntityEventSender {
    sender: Sender<EntityEvent>,
}

impl EntityEventSender {
    /// Fire-and-forget send. A send after the service has been dropped is
    /// silently discarded; despawn notifications can outlive the receiver
    /// during teardown.
    pub fn send(&self, event: EntityEvent) {
        let _ = self.sender.send(event);
    }

    pub fn spawned(&self, entity: EntityId, owner: PlayerId, position: Vec2, vision_radius: f32) {
        self.send(EntityEvent::Spawned {
            entity,
            owner,
            position,
            vision_radius,
        });
    }

    pub fn destroyed(&self, entity: EntityId) {
        self.send(EntityEvent::Destroyed { entity });
    }

    pub fn moved(&self, entity: EntityId, position: Vec2) {
        self.send(EntityEvent::Moved { entity, position });
    }
}

pub(crate) fn event_channel() -> (EntityEventSender, Receiver<EntityEvent>) {
    let (sender, receiver) = unbounded();
    (EntityEventSender { sender }, receiver)
}
