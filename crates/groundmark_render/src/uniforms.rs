//! Per-frame uniform block of the decal program

use groundmark_core::render::{SharedBindings, SunLighting};
use glam::Mat4;

/// Layout matches `Globals` in `decal.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DecalUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub shadow_matrix: [[f32; 4]; 4],
    /// Ground ambient colour in xyz, shadow density in w.
    pub ambient: [f32; 4],
    /// x: shadows on, y: info overlay on, zw: reciprocal map size in world units.
    pub params: [f32; 4],
}

impl Default for DecalUniforms {
    fn default() -> Self {
        let mut uniforms = Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            shadow_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            ambient: [0.0; 4],
            params: [0.0, 0.0, 1.0, 1.0],
        };
        uniforms.set_sun(&SunLighting::default());
        uniforms
    }
}

impl DecalUniforms {
    pub fn set_view_proj(&mut self, view_proj: Mat4) {
        self.view_proj = view_proj.to_cols_array_2d();
    }

    pub fn set_sun(&mut self, sun: &SunLighting) {
        self.ambient = sun.ambient.extend(sun.shadow_density).to_array();
    }

    pub fn apply_bindings(&mut self, bindings: &SharedBindings) {
        match bindings.shadow {
            Some(shadow) => {
                self.shadow_matrix = shadow.matrix.to_cols_array_2d();
                self.params[0] = 1.0;
            }
            None => self.params[0] = 0.0,
        }
        self.params[1] = if bindings.info.is_some() { 1.0 } else { 0.0 };
    }

    /// World-space extent the shading and info textures stretch over.
    pub fn set_map_size(&mut self, width: f32, depth: f32) {
        self.params[2] = 1.0 / width.max(1.0);
        self.params[3] = 1.0 / depth.max(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundmark_core::interfaces::TextureHandle;
    use groundmark_core::render::ShadowBinding;
    use glam::Vec3;

    #[test]
    fn block_is_uniform_aligned() {
        assert_eq!(std::mem::size_of::<DecalUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<DecalUniforms>(), 160);
    }

    #[test]
    fn sun_packs_density_into_w() {
        let mut uniforms = DecalUniforms::default();
        uniforms.set_sun(&SunLighting {
            ambient: Vec3::new(0.25, 0.5, 0.75),
            shadow_density: 0.5,
        });
        assert_eq!(uniforms.ambient, [0.25, 0.5, 0.75, 0.5]);
    }

    #[test]
    fn bindings_toggle_shadow_and_info() {
        let mut uniforms = DecalUniforms::default();
        let matrix = Mat4::from_scale(Vec3::splat(2.0));
        uniforms.apply_bindings(&SharedBindings {
            shading: None,
            shadow: Some(ShadowBinding {
                depth: TextureHandle(1),
                color: TextureHandle(2),
                matrix,
            }),
            info: Some(TextureHandle(3)),
        });
        assert_eq!(uniforms.params[0], 1.0);
        assert_eq!(uniforms.params[1], 1.0);
        assert_eq!(uniforms.shadow_matrix, matrix.to_cols_array_2d());

        uniforms.apply_bindings(&SharedBindings::default());
        assert_eq!(uniforms.params[0], 0.0);
        assert_eq!(uniforms.params[1], 0.0);
    }

    #[test]
    fn map_size_is_stored_as_reciprocal() {
        let mut uniforms = DecalUniforms::default();
        uniforms.set_map_size(2048.0, 1024.0);
        assert_eq!(uniforms.params[2], 1.0 / 2048.0);
        assert_eq!(uniforms.params[3], 1.0 / 1024.0);
    }
}
