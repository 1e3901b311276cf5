//! Simulation events the decal subsystem reacts to
//!
//! The simulation pushes [`DecalEvent`]s into a [`DecalEventQueue`]; the
//! render thread drains the queue into a [`DecalEventListener`] at a fixed
//! point of its frame. Listeners can also be called directly.

use crate::interfaces::{DecalTextureLoader, GhostId, HeightField, ObjectId, ObjectStates};
use crate::objects::SolidObjectInfo;
use crate::time::FrameClock;
use glam::Vec3;
use std::collections::VecDeque;

/// Explosion notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionEvent {
    pub pos: Vec3,
    pub damage: f32,
    /// Crater area of effect.
    pub radius: f32,
    /// The weapon's scar flag; `None` when no weapon caused the blast.
    pub explosion_scar: Option<bool>,
}

impl ExplosionEvent {
    pub fn leaves_scar(&self) -> bool {
        self.explosion_scar.unwrap_or(true)
    }
}

#[derive(Debug, Clone)]
pub enum DecalEvent {
    ObjectCreated(SolidObjectInfo),
    ObjectMoved { object: SolidObjectInfo, pos: Vec3 },
    ObjectDestroyed(ObjectId),
    GhostCreated { object: ObjectId, ghost: GhostId },
    GhostDestroyed(GhostId),
    Explosion(ExplosionEvent),
    UnitLoaded(ObjectId),
    UnitUnloaded(SolidObjectInfo),
}

/// Outside state available while handling an event.
pub struct EventContext<'a> {
    pub clock: &'a FrameClock,
    pub heights: &'a dyn HeightField,
    pub objects: &'a dyn ObjectStates,
    pub textures: &'a mut dyn DecalTextureLoader,
}

/// Observer of decal-relevant simulation events. Every hook defaults to
/// doing nothing.
pub trait DecalEventListener {
    fn on_object_created(&mut self, _object: &SolidObjectInfo, _ctx: &mut EventContext<'_>) {}

    fn on_object_moved(&mut self, _object: &SolidObjectInfo, _pos: Vec3, _ctx: &mut EventContext<'_>) {}

    fn on_object_destroyed(&mut self, _object: ObjectId, _ctx: &mut EventContext<'_>) {}

    /// `object` left line of sight and is now remembered as `ghost`.
    fn on_ghost_created(&mut self, _object: ObjectId, _ghost: GhostId, _ctx: &mut EventContext<'_>) {}

    fn on_ghost_destroyed(&mut self, _ghost: GhostId, _ctx: &mut EventContext<'_>) {}

    fn on_explosion(&mut self, _explosion: &ExplosionEvent, _ctx: &mut EventContext<'_>) {}

    /// Unit picked up by a transport.
    fn on_unit_loaded(&mut self, _unit: ObjectId, _ctx: &mut EventContext<'_>) {}

    fn on_unit_unloaded(&mut self, _unit: &SolidObjectInfo, _ctx: &mut EventContext<'_>) {}
}

impl DecalEvent {
    /// Invoke the matching listener hook.
    pub fn dispatch(&self, listener: &mut dyn DecalEventListener, ctx: &mut EventContext<'_>) {
        match self {
            DecalEvent::ObjectCreated(object) => listener.on_object_created(object, ctx),
            DecalEvent::ObjectMoved { object, pos } => listener.on_object_moved(object, *pos, ctx),
            DecalEvent::ObjectDestroyed(object) => listener.on_object_destroyed(*object, ctx),
            DecalEvent::GhostCreated { object, ghost } => {
                listener.on_ghost_created(*object, *ghost, ctx)
            }
            DecalEvent::GhostDestroyed(ghost) => listener.on_ghost_destroyed(*ghost, ctx),
            DecalEvent::Explosion(explosion) => listener.on_explosion(explosion, ctx),
            DecalEvent::UnitLoaded(unit) => listener.on_unit_loaded(*unit, ctx),
            DecalEvent::UnitUnloaded(unit) => listener.on_unit_unloaded(unit, ctx),
        }
    }
}

/// FIFO of pending events. Not shared across threads.
#[derive(Debug, Default)]
pub struct DecalEventQueue {
    events: VecDeque<DecalEvent>,
}

impl DecalEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: DecalEvent) {
        self.events.push_back(event);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Deliver every queued event in arrival order. Returns how many were
    /// delivered.
    pub fn drain_into(
        &mut self,
        listener: &mut dyn DecalEventListener,
        ctx: &mut EventContext<'_>,
    ) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.events.pop_front() {
            event.dispatch(listener, ctx);
            delivered += 1;
        }
        delivered
    }
}
