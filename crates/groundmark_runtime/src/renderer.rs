//! Draw targets the demo can run against

use anyhow::Result;
use groundmark_asset::{AssetError, TextureUploader};
use groundmark_core::glam::{Mat4, Vec3};
use groundmark_core::interfaces::TextureHandle;
use groundmark_core::map::MapDims;
use groundmark_core::render::recording::RecordingBackend;
use groundmark_core::render::DecalDrawBackend;
use groundmark_render::pipeline::TargetFormats;
use groundmark_render::{wgpu, BackendSettings, OffscreenTarget, WgpuDecalBackend};
use std::sync::Arc;
use tracing::trace;

pub trait DemoRenderer: TextureUploader {
    fn backend(&mut self) -> &mut dyn DecalDrawBackend;
    /// Flush the frame the handler just drew.
    fn end_frame(&mut self) -> Result<()>;
    fn name(&self) -> &'static str;
    /// Draw calls issued so far.
    fn draw_calls(&self) -> usize;
}

/// Records draw calls and hands out texture handles without a GPU.
#[derive(Default)]
pub struct Recorder {
    recording: RecordingBackend,
    textures: u64,
    uploaded_bytes: usize,
    draw_calls: usize,
}

impl TextureUploader for Recorder {
    fn upload_rgba(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        _mipmaps: bool,
    ) -> Result<TextureHandle, AssetError> {
        self.textures += 1;
        self.uploaded_bytes += pixels.len();
        trace!(label, width, height, total_bytes = self.uploaded_bytes, "texture recorded");
        Ok(TextureHandle(self.textures))
    }
}

impl DemoRenderer for Recorder {
    fn backend(&mut self) -> &mut dyn DecalDrawBackend {
        &mut self.recording
    }

    fn end_frame(&mut self) -> Result<()> {
        self.draw_calls += self.recording.draw_calls();
        self.recording.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }

    fn draw_calls(&self) -> usize {
        self.draw_calls
    }
}

/// wgpu backend drawing into an offscreen target.
pub struct Gpu {
    backend: WgpuDecalBackend,
    target: OffscreenTarget,
    draw_calls: usize,
}

impl Gpu {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, map: MapDims) -> Self {
        let formats = TargetFormats::default();
        let target = OffscreenTarget::new(&device, 1024, 1024, formats);
        let mut backend = WgpuDecalBackend::new(
            Arc::new(device),
            Arc::new(queue),
            BackendSettings {
                formats,
                ..BackendSettings::default()
            },
        );

        let (width, depth) = (map.world_width(), map.world_depth());
        let center = Vec3::new(width * 0.5, 0.0, depth * 0.5);
        let view = Mat4::look_at_rh(center + Vec3::Y * 1000.0, center, Vec3::NEG_Z);
        let proj = Mat4::orthographic_rh(
            -width * 0.5,
            width * 0.5,
            -depth * 0.5,
            depth * 0.5,
            1.0,
            2000.0,
        );
        backend.set_view_proj(proj * view);
        backend.set_map_size(width, depth);

        Self {
            backend,
            target,
            draw_calls: 0,
        }
    }
}

impl TextureUploader for Gpu {
    fn upload_rgba(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        mipmaps: bool,
    ) -> Result<TextureHandle, AssetError> {
        self.backend
            .upload_rgba(label, width, height, pixels, mipmaps)
    }
}

impl DemoRenderer for Gpu {
    fn backend(&mut self) -> &mut dyn DecalDrawBackend {
        &mut self.backend
    }

    fn end_frame(&mut self) -> Result<()> {
        self.target.clear(
            self.backend.device(),
            self.backend.queue(),
            wgpu::Color {
                r: 0.32,
                g: 0.28,
                b: 0.2,
                a: 1.0,
            },
        );
        let stats = self
            .backend
            .submit(&self.target.color, &self.target.depth)?;
        self.draw_calls += stats.draw_calls;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn draw_calls(&self) -> usize {
        self.draw_calls
    }
}
