//! Backend that records draw calls instead of issuing them.

use super::{DecalDrawBackend, DecalPass, SharedBindings, SunLighting};
use crate::geometry::{DecalVertex, VERTICES_PER_QUAD};
use crate::interfaces::TextureHandle;
use glam::Vec3;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BindShared { shadows: bool, info: bool },
    BeginPass(DecalPass),
    BindTexture(TextureHandle),
    DrawQuads { quads: usize, offset: Vec3, alpha: u8 },
    Unbind,
    SetSun(SunLighting),
}

/// Records every call; `ready` toggles [`DecalDrawBackend::program_ready`].
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    pub ready: bool,
    commands: Vec<DrawCommand>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            ready: true,
            commands: Vec::new(),
        }
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of `draw_quads` calls.
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawQuads { .. }))
            .count()
    }

    /// Quads drawn during `pass`.
    pub fn quads_in(&self, pass: DecalPass) -> usize {
        let mut current = None;
        let mut quads = 0;
        for command in &self.commands {
            match command {
                DrawCommand::BeginPass(p) => current = Some(*p),
                DrawCommand::DrawQuads { quads: n, .. } if current == Some(pass) => quads += n,
                _ => {}
            }
        }
        quads
    }

    pub fn textures_bound(&self) -> Vec<TextureHandle> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BindTexture(t) => Some(*t),
                _ => None,
            })
            .collect()
    }
}

impl DecalDrawBackend for RecordingBackend {
    fn program_ready(&self) -> bool {
        self.ready
    }

    fn bind_shared(&mut self, bindings: &SharedBindings) {
        self.commands.push(DrawCommand::BindShared {
            shadows: bindings.shadow.is_some(),
            info: bindings.info.is_some(),
        });
    }

    fn begin_pass(&mut self, pass: DecalPass) {
        self.commands.push(DrawCommand::BeginPass(pass));
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.commands.push(DrawCommand::BindTexture(texture));
    }

    fn draw_quads(&mut self, vertices: &[DecalVertex], offset: Vec3) {
        self.commands.push(DrawCommand::DrawQuads {
            quads: vertices.len() / VERTICES_PER_QUAD,
            offset,
            alpha: vertices.first().map_or(0, |v| v.color[3]),
        });
    }

    fn unbind(&mut self) {
        self.commands.push(DrawCommand::Unbind);
    }

    fn set_sun(&mut self, sun: &SunLighting) {
        self.commands.push(DrawCommand::SetSun(*sun));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quads_are_attributed_to_their_pass() {
        let mut backend = RecordingBackend::new();
        let quad = [DecalVertex {
            position: [0.0; 3],
            uv: [0.0; 2],
            color: [255, 255, 255, 128],
        }; 8];

        backend.begin_pass(DecalPass::ObjectDecals);
        backend.draw_quads(&quad, Vec3::ZERO);
        backend.begin_pass(DecalPass::Scars);
        backend.draw_quads(&quad[..4], Vec3::ZERO);

        assert_eq!(backend.quads_in(DecalPass::ObjectDecals), 2);
        assert_eq!(backend.quads_in(DecalPass::Scars), 1);
        assert_eq!(backend.draw_calls(), 2);
    }
}
