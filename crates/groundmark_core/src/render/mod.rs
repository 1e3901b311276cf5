//! Draw-side seam of the decal subsystem
//!
//! The handler decides what is drawn and in which order; a
//! [`DecalDrawBackend`] turns that into GPU work. `groundmark_render` ships
//! the wgpu implementation, [`recording::RecordingBackend`] records calls for
//! tests and headless runs.

pub mod recording;

use crate::geometry::DecalVertex;
use crate::interfaces::TextureHandle;
use glam::{Mat4, Vec3};

/// Draw pass of a decal frame. Object decals always precede scars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecalPass {
    ObjectDecals,
    Scars,
}

/// Polygon offset applied while drawing a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    pub slope_scale: f32,
    pub constant: i32,
}

impl DecalPass {
    /// Scars are pushed further toward the camera than object decals.
    pub const fn depth_bias(self) -> DepthBias {
        match self {
            DecalPass::ObjectDecals => DepthBias {
                slope_scale: -10.0,
                constant: -200,
            },
            DecalPass::Scars => DepthBias {
                slope_scale: -10.0,
                constant: -400,
            },
        }
    }
}

/// Shadow map inputs, present only while shadows are enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowBinding {
    pub depth: TextureHandle,
    pub color: TextureHandle,
    pub matrix: Mat4,
}

/// Textures bound once per frame for every decal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SharedBindings {
    /// Terrain shading texture modulating decal colour.
    pub shading: Option<TextureHandle>,
    pub shadow: Option<ShadowBinding>,
    /// Overlay (metal map, LOS view, ...) when one is active.
    pub info: Option<TextureHandle>,
}

/// Sun parameters feeding the decal shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunLighting {
    pub ambient: Vec3,
    pub shadow_density: f32,
}

impl Default for SunLighting {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.5),
            shadow_density: 0.8,
        }
    }
}

/// GPU primitives the decal frame is expressed in.
///
/// Calls arrive in this order per frame:
/// `bind_shared`, then per pass `begin_pass` followed by any number of
/// `bind_texture` / `draw_quads`, then `unbind`. Vertices passed to
/// `draw_quads` must be consumed before the call returns.
pub trait DecalDrawBackend {
    /// Whether the decal program compiled; nothing is drawn without it.
    fn program_ready(&self) -> bool;
    fn bind_shared(&mut self, bindings: &SharedBindings);
    fn begin_pass(&mut self, pass: DecalPass);
    fn bind_texture(&mut self, texture: TextureHandle);
    /// Draw quads (4 vertices each) translated by `offset`.
    fn draw_quads(&mut self, vertices: &[DecalVertex], offset: Vec3);
    fn unbind(&mut self);
    fn set_sun(&mut self, _sun: &SunLighting) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scars_are_biased_further_than_object_decals() {
        let objects = DecalPass::ObjectDecals.depth_bias();
        let scars = DecalPass::Scars.depth_bias();
        assert_eq!(objects.slope_scale, scars.slope_scale);
        assert!(scars.constant < objects.constant);
    }
}
