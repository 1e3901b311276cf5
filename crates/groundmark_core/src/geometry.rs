//! Terrain-conforming quad geometry cached per decal and per scar.
//!
//! Geometry is built once, on the first draw after creation or after an
//! explicit [`DecalGeometry::invalidate`]. Later frames only rewrite the
//! height and colour of the existing vertices, since terrain can deform
//! under a decal at any time. X/Z and texture coordinates never change
//! after the build.

use crate::interfaces::HeightField;
use crate::map::{MapDims, SCAR_TEXEL_SIZE, SQUARE_SIZE};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub const VERTICES_PER_QUAD: usize = 4;

/// Vertex layout shared by object decals and scars.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DecalVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

impl DecalVertex {
    #[inline]
    fn new(position: Vec3, uv: Vec2, color: [u8; 4]) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            color,
        }
    }
}

/// White tinted by `alpha` in [0, 1].
#[inline]
pub fn alpha_color(alpha: f32) -> [u8; 4] {
    [255, 255, 255, (alpha.clamp(0.0, 1.0) * 255.0) as u8]
}

/// Build facing of an object; rotates the decal texture in 90 degree steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    South,
    East,
    North,
    West,
}

impl Facing {
    /// East and West swap the footprint's x and z extents.
    #[inline]
    pub fn is_sideways(self) -> bool {
        matches!(self, Facing::East | Facing::West)
    }
}

/// Object decal footprint in heightmap squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Footprint {
    /// Top-left square, may lie off-map.
    pub x: i32,
    pub z: i32,
    pub xsize: i32,
    pub zsize: i32,
    pub facing: Facing,
}

impl Footprint {
    /// Texture coordinates of the square at decal-space `(rx, rz)`, corners
    /// in (tl, tr, br, bl) order.
    fn square_uvs(&self, rx: i32, rz: i32) -> [Vec2; 4] {
        let xts = 1.0 / self.xsize as f32;
        let zts = 1.0 / self.zsize as f32;
        let (rx, rz) = (rx as f32, rz as f32);
        let (dx, dz) = (self.xsize as f32, self.zsize as f32);

        match self.facing {
            Facing::South => [
                Vec2::new(rx * xts, rz * zts),
                Vec2::new((rx + 1.0) * xts, rz * zts),
                Vec2::new((rx + 1.0) * xts, (rz + 1.0) * zts),
                Vec2::new(rx * xts, (rz + 1.0) * zts),
            ],
            Facing::North => [
                Vec2::new((dx - rx) * xts, (dz - rz) * zts),
                Vec2::new((dx - rx - 1.0) * xts, (dz - rz) * zts),
                Vec2::new((dx - rx - 1.0) * xts, (dz - rz - 1.0) * zts),
                Vec2::new((dx - rx) * xts, (dz - rz - 1.0) * zts),
            ],
            Facing::East => [
                Vec2::new(1.0 - rz * zts, rx * xts),
                Vec2::new(1.0 - rz * zts, (rx + 1.0) * xts),
                Vec2::new(1.0 - (rz + 1.0) * zts, (rx + 1.0) * xts),
                Vec2::new(1.0 - (rz + 1.0) * zts, rx * xts),
            ],
            Facing::West => [
                Vec2::new(rz * zts, 1.0 - rx * xts),
                Vec2::new(rz * zts, 1.0 - (rx + 1.0) * xts),
                Vec2::new((rz + 1.0) * zts, 1.0 - (rx + 1.0) * xts),
                Vec2::new((rz + 1.0) * zts, 1.0 - rx * xts),
            ],
        }
    }
}

/// Lazily built vertex storage. Quads are stored as 4 consecutive vertices.
#[derive(Debug, Default)]
pub struct DecalGeometry {
    vertices: Vec<DecalVertex>,
    built: bool,
}

impl DecalGeometry {
    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    #[inline]
    pub fn vertices(&self) -> &[DecalVertex] {
        &self.vertices
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    /// Drop the cached vertices (keeping their allocation) so the next draw
    /// rebuilds them.
    pub fn invalidate(&mut self) {
        self.vertices.clear();
        self.built = false;
    }

    fn push_quad(&mut self, corners: [Vec3; 4], uvs: [Vec2; 4], color: [u8; 4]) {
        for (corner, uv) in corners.into_iter().zip(uvs) {
            self.vertices.push(DecalVertex::new(corner, uv, color));
        }
    }

    /// One quad per heightmap square of the footprint, clipped to the map.
    pub fn build_footprint(
        &mut self,
        footprint: &Footprint,
        heights: &dyn HeightField,
        map: MapDims,
        color: [u8; 4],
    ) {
        self.vertices.clear();

        let xoff = (-footprint.x).max(0);
        let zoff = (-footprint.z).max(0);
        let mut cxsize = footprint.xsize - xoff;
        let mut czsize = footprint.zsize - zoff;
        if footprint.x + footprint.xsize > map.mapx {
            cxsize -= footprint.x + footprint.xsize - map.mapx;
        }
        if footprint.z + footprint.zsize > map.mapy {
            czsize -= footprint.z + footprint.zsize - map.mapy;
        }

        let square = SQUARE_SIZE as f32;
        let corner = |px: i32, pz: i32| {
            let (x, z) = (px as f32 * square, pz as f32 * square);
            Vec3::new(x, heights.height_at(x, z), z)
        };

        for vx in 0..cxsize.max(0) {
            for vz in 0..czsize.max(0) {
                let rx = xoff + vx;
                let rz = zoff + vz;
                let px = footprint.x + rx;
                let pz = footprint.z + rz;

                let corners = [
                    corner(px, pz),
                    corner(px + 1, pz),
                    corner(px + 1, pz + 1),
                    corner(px, pz + 1),
                ];
                self.push_quad(corners, footprint.square_uvs(rx, rz), color);
            }
        }

        self.built = true;
    }

    /// One quad per scar texel within `radius` of `center`, texture
    /// coordinates mapped into the atlas quadrant at `atlas_offset`.
    pub fn build_scar(
        &mut self,
        center: Vec3,
        radius: f32,
        atlas_offset: Vec2,
        heights: &dyn HeightField,
        map: MapDims,
        color: [u8; 4],
    ) {
        self.vertices.clear();

        let quad = SCAR_TEXEL_SIZE as f32;
        let inv_quad = 1.0 / quad;
        let radius4 = radius * 4.0;

        let sx = ((center.x - radius) * inv_quad).max(0.0) as i32;
        let ex = ((center.x + radius) * inv_quad).min((map.hmapx() - 1) as f32) as i32;
        let sz = ((center.z - radius) * inv_quad).max(0.0) as i32;
        let ez = ((center.z + radius) * inv_quad).min((map.hmapy() - 1) as f32) as i32;

        let mut px1 = sx as f32 * quad;
        for _ in sx..=ex {
            let px2 = px1 + quad;
            let mut pz1 = sz as f32 * quad;

            for _ in sz..=ez {
                let pz2 = pz1 + quad;
                let tx1 = ((center.x - px1) / radius4 + 0.25).min(0.5) + atlas_offset.x;
                let tx2 = ((center.x - px2) / radius4 + 0.25).max(0.0) + atlas_offset.x;
                let tz1 = ((center.z - pz1) / radius4 + 0.25).min(0.5) + atlas_offset.y;
                let tz2 = ((center.z - pz2) / radius4 + 0.25).max(0.0) + atlas_offset.y;

                let corners = [
                    Vec3::new(px1, heights.height_at(px1, pz1), pz1),
                    Vec3::new(px2, heights.height_at(px2, pz1), pz1),
                    Vec3::new(px2, heights.height_at(px2, pz2), pz2),
                    Vec3::new(px1, heights.height_at(px1, pz2), pz2),
                ];
                let uvs = [
                    Vec2::new(tx1, tz1),
                    Vec2::new(tx2, tz1),
                    Vec2::new(tx2, tz2),
                    Vec2::new(tx1, tz2),
                ];
                self.push_quad(corners, uvs, color);
                pz1 = pz2;
            }

            px1 = px2;
        }

        self.built = true;
    }

    /// Re-sample terrain height and rewrite the colour of every vertex.
    pub fn refresh(&mut self, heights: &dyn HeightField, color: [u8; 4]) {
        for vertex in &mut self.vertices {
            let [x, _, z] = vertex.position;
            vertex.position[1] = heights.height_at(x, z);
            vertex.color = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(h: f32) -> impl Fn(f32, f32) -> f32 {
        move |_, _| h
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<DecalVertex>(), 24);
    }

    #[test]
    fn footprint_builds_one_quad_per_square() {
        let mut geometry = DecalGeometry::default();
        let footprint = Footprint {
            x: 10,
            z: 20,
            xsize: 4,
            zsize: 2,
            facing: Facing::South,
        };
        geometry.build_footprint(&footprint, &flat(3.0), MapDims::new(64, 64), alpha_color(1.0));

        assert!(geometry.is_built());
        assert_eq!(geometry.quad_count(), 8);
        let first = geometry.vertices()[0];
        assert_eq!(first.position, [80.0, 3.0, 160.0]);
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(first.color, [255, 255, 255, 255]);
    }

    #[test]
    fn footprint_is_clipped_at_map_edges() {
        let mut geometry = DecalGeometry::default();
        let footprint = Footprint {
            x: -2,
            z: 62,
            xsize: 4,
            zsize: 4,
            facing: Facing::South,
        };
        geometry.build_footprint(&footprint, &flat(0.0), MapDims::new(64, 64), alpha_color(1.0));

        // x: squares 0..2, z: squares 62..64
        assert_eq!(geometry.quad_count(), 4);
        assert!(geometry
            .vertices()
            .iter()
            .all(|v| v.position[0] >= 0.0 && v.position[2] <= 64.0 * 8.0));
        // clipped squares keep their decal-space texture coordinates
        assert_eq!(geometry.vertices()[0].uv, [0.5, 0.0]);
    }

    #[test]
    fn facing_rotates_texture_corners() {
        let footprint = |facing| Footprint {
            x: 0,
            z: 0,
            xsize: 2,
            zsize: 2,
            facing,
        };
        let tl = |facing| footprint(facing).square_uvs(0, 0)[0];

        assert_eq!(tl(Facing::South), Vec2::new(0.0, 0.0));
        assert_eq!(tl(Facing::North), Vec2::new(1.0, 1.0));
        assert_eq!(tl(Facing::East), Vec2::new(1.0, 0.0));
        assert_eq!(tl(Facing::West), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn scar_quads_cover_radius_and_stay_in_atlas_quadrant() {
        let mut geometry = DecalGeometry::default();
        let offset = Vec2::new(0.5, 0.0);
        geometry.build_scar(
            Vec3::new(400.0, 0.0, 400.0),
            40.0,
            offset,
            &flat(1.0),
            MapDims::new(128, 128),
            [255; 4],
        );

        // texels 22..=27 on both axes
        assert_eq!(geometry.quad_count(), 36);
        for v in geometry.vertices() {
            assert!(v.uv[0] >= 0.5 && v.uv[0] <= 1.0);
            assert!(v.uv[1] >= 0.0 && v.uv[1] <= 0.5);
        }
    }

    #[test]
    fn refresh_only_touches_height_and_color() {
        let mut geometry = DecalGeometry::default();
        let footprint = Footprint {
            x: 0,
            z: 0,
            xsize: 2,
            zsize: 2,
            facing: Facing::East,
        };
        let map = MapDims::new(16, 16);
        geometry.build_footprint(&footprint, &flat(0.0), map, alpha_color(0.0));
        let before: Vec<_> = geometry.vertices().to_vec();

        let crater = |x: f32, z: f32| -(x + z) * 0.1;
        geometry.refresh(&crater, alpha_color(0.5));

        for (old, new) in before.iter().zip(geometry.vertices()) {
            assert_eq!(old.position[0], new.position[0]);
            assert_eq!(old.position[2], new.position[2]);
            assert_eq!(old.uv, new.uv);
            assert_eq!(new.position[1], crater(new.position[0], new.position[2]));
            assert_eq!(new.color[3], 127);
        }
    }

    #[test]
    fn invalidate_keeps_capacity() {
        let mut geometry = DecalGeometry::default();
        let footprint = Footprint {
            x: 0,
            z: 0,
            xsize: 4,
            zsize: 4,
            facing: Facing::South,
        };
        geometry.build_footprint(&footprint, &flat(0.0), MapDims::new(16, 16), [255; 4]);
        let capacity = geometry.vertices.capacity();

        geometry.invalidate();
        assert!(!geometry.is_built());
        assert!(geometry.vertices().is_empty());
        assert_eq!(geometry.vertices.capacity(), capacity);
    }
}
