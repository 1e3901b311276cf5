//! Test doubles for driving the handler without an engine.

#![allow(dead_code)]

use groundmark_core::error::{DecalError, ResourceKind};
use groundmark_core::geometry::Facing;
use groundmark_core::glam::Vec3;
use groundmark_core::interfaces::{
    DecalTextureLoader, FrameContext, GhostId, LosQuery, LosStatus, ObjectId, ObjectStates,
    OwnerState, TextureHandle, ViewCuller,
};
use groundmark_core::map::MapDims;
use groundmark_core::objects::{GroundDecalDef, SolidObjectInfo};
use groundmark_core::render::SharedBindings;
use groundmark_core::time::FrameClock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const MAP: MapDims = MapDims::new(256, 256);
pub const ATLAS: TextureHandle = TextureHandle(1000);

/// Hands out sequential texture handles; names listed in `missing` fail.
#[derive(Default)]
pub struct Textures {
    pub next: u64,
    pub missing: Vec<String>,
    pub atlas_missing: bool,
}

impl DecalTextureLoader for Textures {
    fn load_object_decal_texture(&mut self, name: &str) -> Result<TextureHandle, DecalError> {
        if self.missing.iter().any(|m| m == name) {
            return Err(DecalError::resource(
                ResourceKind::ObjectDecalTexture,
                name,
                "no such file",
            ));
        }
        self.next += 1;
        Ok(TextureHandle(self.next))
    }

    fn load_scar_atlas(&mut self) -> Result<TextureHandle, DecalError> {
        if self.atlas_missing {
            Err(DecalError::resource(ResourceKind::ScarAtlas, "scars", "no such file"))
        } else {
            Ok(ATLAS)
        }
    }
}

/// Scripted simulation state.
#[derive(Default)]
pub struct World {
    pub units: HashMap<ObjectId, (OwnerState, LosStatus)>,
    /// Feature id -> draw alpha.
    pub features: HashMap<ObjectId, f32>,
    pub features_in_los: bool,
    pub ghost_frames: HashMap<GhostId, u64>,
    pub full_view: bool,
}

impl World {
    pub fn with_unit(mut self, id: u64, build_progress: f32, los: LosStatus) -> Self {
        self.set_unit(id, build_progress, los);
        self
    }

    pub fn set_unit(&mut self, id: u64, build_progress: f32, los: LosStatus) {
        self.units.insert(
            ObjectId(id),
            (
                OwnerState::Unit {
                    build_progress,
                    is_icon: false,
                },
                los,
            ),
        );
    }

    pub fn set_icon(&mut self, id: u64, los: LosStatus) {
        self.units.insert(
            ObjectId(id),
            (
                OwnerState::Unit {
                    build_progress: 1.0,
                    is_icon: true,
                },
                los,
            ),
        );
    }

    pub fn set_feature(&mut self, id: u64, draw_alpha: f32) {
        self.features.insert(ObjectId(id), draw_alpha);
    }
}

impl ObjectStates for World {
    fn owner_state(&self, object: ObjectId) -> Option<OwnerState> {
        self.units
            .get(&object)
            .map(|(state, _)| *state)
            .or_else(|| {
                self.features
                    .get(&object)
                    .map(|&draw_alpha| OwnerState::Feature { draw_alpha })
            })
    }

    fn ghost_last_draw_frame(&self, ghost: GhostId) -> Option<u64> {
        self.ghost_frames.get(&ghost).copied()
    }
}

impl LosQuery for World {
    fn unit_los(&self, unit: ObjectId) -> LosStatus {
        self.units.get(&unit).map_or(LosStatus::NONE, |(_, los)| *los)
    }

    fn feature_in_los(&self, _feature: ObjectId) -> bool {
        self.features_in_los
    }

    fn full_view(&self) -> bool {
        self.full_view
    }
}

pub fn flat(_x: f32, _z: f32) -> f32 {
    0.0
}

pub fn everywhere(_pos: Vec3, _radius: f32) -> bool {
    true
}

pub fn nowhere(_pos: Vec3, _radius: f32) -> bool {
    false
}

pub fn building(id: u64, pos: Vec3, decay_speed: f32) -> SolidObjectInfo {
    SolidObjectInfo {
        id: ObjectId(id),
        pos,
        facing: Facing::South,
        decal: Arc::new(GroundDecalDef {
            use_ground_decal: true,
            type_name: "Factory".into(),
            size_x: 2,
            size_y: 2,
            decay_speed,
        }),
    }
}

/// Clock at sim frame `sim`, one draw frame of `step_ms` in.
pub fn clock(sim: u64, step_ms: u64) -> FrameClock {
    let mut clock = FrameClock::new();
    clock.set_sim_frame(sim);
    clock.begin_draw_frame(Duration::from_millis(step_ms));
    clock
}

pub fn frame<'a>(
    clock: &'a FrameClock,
    world: &'a World,
    bindings: &'a SharedBindings,
    culler: &'a dyn ViewCuller,
) -> FrameContext<'a> {
    FrameContext {
        clock,
        heights: &flat,
        culler,
        los: world,
        objects: world,
        bindings,
    }
}
