use crate::arena::{Recycle, SlotId};
use crate::geometry::{DecalGeometry, Facing, Footprint};
use crate::interfaces::{GhostId, ObjectId, TextureHandle};
use crate::map::SQUARE_SIZE;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Handle of an object decal in the pool.
pub type DecalId = SlotId;

/// Index of a decal type. Types are never destroyed during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecalTypeId(pub(crate) u32);

impl DecalTypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Who a decal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecalOwner {
    /// A unit or feature that still exists.
    Live(ObjectId),
    /// A remembered building outside line of sight.
    Ghost(GhostId),
    /// Nobody; the decal fades out and is destroyed.
    #[default]
    Orphaned,
}

/// Ground decal part of an object definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundDecalDef {
    pub use_ground_decal: bool,
    /// Texture name, looked up case-insensitively.
    pub type_name: String,
    /// Footprint size in footprint squares (two heightmap squares each).
    pub size_x: i32,
    pub size_y: i32,
    /// Alpha lost per second once orphaned.
    pub decay_speed: f32,
}

impl Default for GroundDecalDef {
    fn default() -> Self {
        Self {
            use_ground_decal: false,
            type_name: String::new(),
            size_x: 0,
            size_y: 0,
            decay_speed: 1.0,
        }
    }
}

/// Snapshot of a unit or feature handed in with create/move events.
#[derive(Debug, Clone)]
pub struct SolidObjectInfo {
    pub id: ObjectId,
    pub pos: Vec3,
    pub facing: Facing,
    pub decal: Arc<GroundDecalDef>,
}

impl SolidObjectInfo {
    /// Footprint of this object's decal at world position `pos`, in
    /// heightmap squares.
    pub fn footprint_at(&self, pos: Vec3) -> Footprint {
        let mut xsize = self.decal.size_x * 2;
        let mut zsize = self.decal.size_y * 2;
        if self.facing.is_sideways() {
            std::mem::swap(&mut xsize, &mut zsize);
        }
        let square = SQUARE_SIZE as f32;
        Footprint {
            x: (pos.x / square) as i32 - xsize / 2,
            z: (pos.z / square) as i32 - zsize / 2,
            xsize,
            zsize,
            facing: self.facing,
        }
    }

    /// Culling radius of this object's decal.
    pub fn cull_radius(&self) -> f32 {
        let (sx, sy) = (self.decal.size_x as f32, self.decal.size_y as f32);
        (sx * sx + sy * sy).sqrt() * SQUARE_SIZE as f32 + 20.0
    }
}

/// Footprint decal under a building, unit or feature.
#[derive(Debug, Default)]
pub struct ObjectGroundDecal {
    pub(crate) owner: DecalOwner,
    pub(crate) pos: Vec3,
    pub(crate) footprint: Footprint,
    pub(crate) decal_type: Option<DecalTypeId>,
    pub(crate) alpha: f32,
    pub(crate) alpha_falloff: f32,
    pub(crate) radius: f32,
    pub(crate) geometry: DecalGeometry,
    /// Position in the type's decal list.
    pub(crate) list_index: usize,
}

impl Recycle for ObjectGroundDecal {
    fn recycle(&mut self) {
        let mut geometry = std::mem::take(&mut self.geometry);
        geometry.invalidate();
        *self = ObjectGroundDecal {
            geometry,
            ..ObjectGroundDecal::default()
        };
    }
}

impl ObjectGroundDecal {
    pub fn owner(&self) -> DecalOwner {
        self.owner
    }

    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn decal_type(&self) -> Option<DecalTypeId> {
        self.decal_type
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_falloff(&self) -> f32 {
        self.alpha_falloff
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn geometry(&self) -> &DecalGeometry {
        &self.geometry
    }

    /// Translation aligning the square-snapped footprint with the object
    /// standing on it.
    pub fn draw_offset(&self) -> Vec3 {
        Vec3::new(
            (self.pos.x as i32 % SQUARE_SIZE) as f32,
            0.0,
            (self.pos.z as i32 % SQUARE_SIZE) as f32,
        )
    }
}

/// Decals sharing one texture.
#[derive(Debug)]
pub struct SolidObjectDecalType {
    pub(crate) name: String,
    pub(crate) texture: TextureHandle,
    pub(crate) decals: Vec<DecalId>,
}

impl SolidObjectDecalType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn decals(&self) -> &[DecalId] {
        &self.decals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(facing: Facing, pos: Vec3) -> SolidObjectInfo {
        SolidObjectInfo {
            id: ObjectId(1),
            pos,
            facing,
            decal: Arc::new(GroundDecalDef {
                use_ground_decal: true,
                type_name: "Factory".into(),
                size_x: 3,
                size_y: 4,
                decay_speed: 0.5,
            }),
        }
    }

    #[test]
    fn footprint_doubles_size_and_centres_on_object() {
        let object = info(Facing::South, Vec3::new(100.0, 0.0, 200.0));
        let fp = object.footprint_at(object.pos);
        assert_eq!((fp.xsize, fp.zsize), (6, 8));
        assert_eq!((fp.x, fp.z), (12 - 3, 25 - 4));
    }

    #[test]
    fn sideways_facing_swaps_extents() {
        let object = info(Facing::West, Vec3::new(100.0, 0.0, 200.0));
        let fp = object.footprint_at(object.pos);
        assert_eq!((fp.xsize, fp.zsize), (8, 6));
        assert_eq!(fp.facing, Facing::West);
    }

    #[test]
    fn cull_radius_covers_footprint() {
        let object = info(Facing::South, Vec3::ZERO);
        assert!((object.cull_radius() - (5.0 * 8.0 + 20.0)).abs() < 1e-4);
    }

    #[test]
    fn draw_offset_is_sub_square_remainder() {
        let decal = ObjectGroundDecal {
            pos: Vec3::new(101.5, 30.0, 203.0),
            ..Default::default()
        };
        assert_eq!(decal.draw_offset(), Vec3::new(5.0, 0.0, 3.0));
    }
}
