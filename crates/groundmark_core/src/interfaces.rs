//! Collaborator interfaces consumed by the decal subsystem
//!
//! The terrain, camera, line-of-sight state, simulation objects and texture
//! loading all live outside this crate. Each is reached through a narrow
//! trait so the handler can be driven by the engine or by test doubles.

use crate::error::DecalError;
use crate::render::SharedBindings;
use crate::time::FrameClock;
use glam::Vec3;

/// Simulation object (unit or feature) identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Ghost placeholder identifier (remembered, out-of-LOS object).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GhostId(pub u64);

/// Opaque texture handle issued by the texture provider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Per-ally-team line-of-sight bits of one unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct LosStatus(u8);

impl LosStatus {
    pub const NONE: LosStatus = LosStatus(0);
    pub const IN_LOS: LosStatus = LosStatus(1 << 0);
    pub const IN_RADAR: LosStatus = LosStatus(1 << 1);
    pub const PREV_LOS: LosStatus = LosStatus(1 << 2);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: LosStatus) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: LosStatus) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn in_los(self) -> bool {
        self.contains(Self::IN_LOS)
    }

    #[inline]
    pub const fn prev_los(self) -> bool {
        self.contains(Self::PREV_LOS)
    }
}

impl std::ops::BitOr for LosStatus {
    type Output = LosStatus;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Terrain height sampler, in world units.
pub trait HeightField {
    fn height_at(&self, x: f32, z: f32) -> f32;
}

impl<F> HeightField for F
where
    F: Fn(f32, f32) -> f32,
{
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

/// Camera visibility predicate.
pub trait ViewCuller {
    fn in_view(&self, pos: Vec3, radius: f32) -> bool;
}

impl<F> ViewCuller for F
where
    F: Fn(Vec3, f32) -> bool,
{
    fn in_view(&self, pos: Vec3, radius: f32) -> bool {
        self(pos, radius)
    }
}

/// Line-of-sight state as seen by the local viewpoint's ally-team.
pub trait LosQuery {
    fn unit_los(&self, unit: ObjectId) -> LosStatus;
    fn feature_in_los(&self, feature: ObjectId) -> bool;
    /// Spectators with full view see everything.
    fn full_view(&self) -> bool {
        false
    }
}

/// Owner state a decal derives its alpha from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OwnerState {
    Unit { build_progress: f32, is_icon: bool },
    Feature { draw_alpha: f32 },
}

/// Live simulation objects and ghosts, queried once per decal per frame.
pub trait ObjectStates {
    /// `None` when the object no longer exists.
    fn owner_state(&self, object: ObjectId) -> Option<OwnerState>;
    /// Draw frame in which the ghost was last rendered.
    fn ghost_last_draw_frame(&self, ghost: GhostId) -> Option<u64>;
}

/// Texture provider for decal types and the scar atlas.
pub trait DecalTextureLoader {
    fn load_object_decal_texture(&mut self, name: &str) -> Result<TextureHandle, DecalError>;
    fn load_scar_atlas(&mut self) -> Result<TextureHandle, DecalError>;
}

/// Everything a draw frame reads from the outside world.
pub struct FrameContext<'a> {
    pub clock: &'a FrameClock,
    pub heights: &'a dyn HeightField,
    pub culler: &'a dyn ViewCuller,
    pub los: &'a dyn LosQuery,
    pub objects: &'a dyn ObjectStates,
    pub bindings: &'a SharedBindings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn los_bits_compose() {
        let status = LosStatus::IN_RADAR | LosStatus::PREV_LOS;
        assert!(status.prev_los());
        assert!(!status.in_los());
        assert_eq!(LosStatus::from_bits(status.bits()), status);
    }

    #[test]
    fn closures_act_as_collaborators() {
        let slope = |x: f32, _z: f32| x * 0.5;
        assert_eq!(slope.height_at(10.0, 3.0), 5.0);

        let near_origin = |p: Vec3, r: f32| p.length() <= 100.0 + r;
        assert!(near_origin.in_view(Vec3::new(50.0, 0.0, 0.0), 0.0));
        assert!(!near_origin.in_view(Vec3::new(500.0, 0.0, 0.0), 10.0));
    }
}
