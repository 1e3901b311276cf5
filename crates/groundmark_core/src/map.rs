//! Map dimensions and the coordinate spaces decals live in
//!
//! - world units: simulation positions
//! - heightmap squares: `SQUARE_SIZE` world units, object decal quads
//! - scar texels: `SCAR_TEXEL_SIZE` world units, scar bounds and scar quads

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World units per heightmap square.
pub const SQUARE_SIZE: i32 = 8;
/// World units per scar texel (two heightmap squares).
pub const SCAR_TEXEL_SIZE: i32 = SQUARE_SIZE * 2;
/// Scar texels per spatial index cell along each axis.
pub const SCAR_CELL_TEXELS: i32 = 16;

/// Map size in heightmap squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDims {
    pub mapx: i32,
    pub mapy: i32,
}

impl MapDims {
    pub const fn new(mapx: i32, mapy: i32) -> Self {
        Self { mapx, mapy }
    }

    /// Width in scar texels.
    #[inline]
    pub const fn hmapx(&self) -> i32 {
        self.mapx / 2
    }

    /// Depth in scar texels.
    #[inline]
    pub const fn hmapy(&self) -> i32 {
        self.mapy / 2
    }

    #[inline]
    pub fn world_width(&self) -> f32 {
        (self.mapx * SQUARE_SIZE) as f32
    }

    #[inline]
    pub fn world_depth(&self) -> f32 {
        (self.mapy * SQUARE_SIZE) as f32
    }

    /// Clamp x/z into the playable area, keeping y.
    pub fn clamp_in_bounds(&self, pos: Vec3) -> Vec3 {
        Vec3::new(
            pos.x.clamp(0.0, self.world_width()),
            pos.y,
            pos.z.clamp(0.0, self.world_depth()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_extents() {
        let map = MapDims::new(512, 256);
        assert_eq!(map.hmapx(), 256);
        assert_eq!(map.hmapy(), 128);
        assert_eq!(map.world_width(), 4096.0);
        assert_eq!(map.world_depth(), 2048.0);
    }

    #[test]
    fn clamp_keeps_height() {
        let map = MapDims::new(64, 64);
        let p = map.clamp_in_bounds(Vec3::new(-5.0, 12.0, 900.0));
        assert_eq!(p, Vec3::new(0.0, 12.0, 512.0));
    }
}
