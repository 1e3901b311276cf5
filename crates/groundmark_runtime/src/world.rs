//! Minimal skirmish state the decal handler queries

use groundmark_core::glam::Vec3;
use groundmark_core::interfaces::{
    GhostId, HeightField, LosQuery, LosStatus, ObjectId, ObjectStates, OwnerState,
};
use groundmark_core::map::MapDims;
use std::collections::HashMap;

/// Rolling hills over the whole map.
#[derive(Debug, Clone, Copy)]
pub struct Terrain {
    pub map: MapDims,
}

impl HeightField for Terrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        let u = x / self.map.world_width().max(1.0);
        let v = z / self.map.world_depth().max(1.0);
        40.0 * (u * std::f32::consts::TAU * 2.0).sin() * (v * std::f32::consts::TAU).cos()
    }
}

#[derive(Debug, Clone, Copy)]
struct Unit {
    build_progress: f32,
    los: LosStatus,
}

#[derive(Debug, Default)]
pub struct World {
    units: HashMap<ObjectId, Unit>,
    /// Ghost to the draw frame it was last rendered in.
    ghosts: HashMap<GhostId, u64>,
}

impl World {
    pub fn spawn(&mut self, id: ObjectId) {
        self.units.insert(
            id,
            Unit {
                build_progress: 1.0,
                los: LosStatus::IN_LOS | LosStatus::PREV_LOS,
            },
        );
    }

    pub fn kill(&mut self, id: ObjectId) -> bool {
        self.units.remove(&id).is_some()
    }

    /// `id` drops out of line of sight and leaves `ghost` behind.
    pub fn lose_sight(&mut self, id: ObjectId, ghost: GhostId, draw_frame: u64) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.los = LosStatus::PREV_LOS;
        }
        self.ghosts.insert(ghost, draw_frame);
    }

    pub fn forget_ghost(&mut self, ghost: GhostId) {
        self.ghosts.remove(&ghost);
    }

    /// Every ghost is on screen in the demo.
    pub fn draw_ghosts(&mut self, draw_frame: u64) {
        for frame in self.ghosts.values_mut() {
            *frame = draw_frame;
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

impl ObjectStates for World {
    fn owner_state(&self, object: ObjectId) -> Option<OwnerState> {
        self.units.get(&object).map(|unit| OwnerState::Unit {
            build_progress: unit.build_progress,
            is_icon: false,
        })
    }

    fn ghost_last_draw_frame(&self, ghost: GhostId) -> Option<u64> {
        self.ghosts.get(&ghost).copied()
    }
}

impl LosQuery for World {
    fn unit_los(&self, unit: ObjectId) -> LosStatus {
        self.units.get(&unit).map_or(LosStatus::NONE, |u| u.los)
    }

    fn feature_in_los(&self, _feature: ObjectId) -> bool {
        true
    }
}

/// Ground-level point at map coordinates `(x, z)`.
pub fn ground(terrain: &Terrain, x: f32, z: f32) -> Vec3 {
    Vec3::new(x, terrain.height_at(x, z), z)
}
