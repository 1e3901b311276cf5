//! wgpu decal backend
//!
//! Implements the handler's draw seam by staging quads into a
//! [`QuadBatch`]; [`WgpuDecalBackend::submit`] then records one render pass
//! that switches pipelines per decal pass and bind groups per texture.

use crate::batch::{quad_indices, QuadBatch};
use crate::error::RenderError;
use crate::pipeline::{DecalPipelines, TargetFormats};
use crate::texture::{TextureKind, TextureRegistry};
use crate::uniforms::DecalUniforms;
use groundmark_asset::{AssetError, TextureUploader};
use groundmark_core::geometry::{DecalVertex, VERTICES_PER_QUAD};
use groundmark_core::interfaces::TextureHandle;
use groundmark_core::render::{DecalDrawBackend, DecalPass, SharedBindings, SunLighting};
use glam::{Mat4, Vec3};
use std::sync::Arc;
use tracing::{error, info, trace, warn};
use wgpu::util::DeviceExt;

#[derive(Debug, Clone, Copy)]
pub struct BackendSettings {
    /// Upper bound on quads submitted per frame.
    pub max_quads: usize,
    pub formats: TargetFormats,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            max_quads: 1 << 16,
            formats: TargetFormats::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitStats {
    pub draw_calls: usize,
    pub quads: usize,
    pub dropped_quads: usize,
    pub skipped_runs: usize,
}

pub struct WgpuDecalBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipelines: DecalPipelines,
    program_ready: bool,
    textures: TextureRegistry,
    globals: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    batch: QuadBatch,
    uniforms: DecalUniforms,
    shared: SharedBindings,
}

impl WgpuDecalBackend {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, settings: BackendSettings) -> Self {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipelines = DecalPipelines::new(&device, settings.formats);
        let program_ready = match pollster::block_on(device.pop_error_scope()) {
            None => true,
            Some(err) => {
                error!(error = %err, "decal program failed to build");
                false
            }
        };

        let textures = TextureRegistry::new(&device, &queue);
        let uniforms = DecalUniforms::default();
        let globals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("decal-globals"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let max_quads = settings.max_quads.max(1);
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("decal-vertices"),
            size: (max_quads * VERTICES_PER_QUAD * std::mem::size_of::<DecalVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("decal-indices"),
            contents: bytemuck::cast_slice(&quad_indices(max_quads)),
            usage: wgpu::BufferUsages::INDEX,
        });

        info!(max_quads, program_ready, "wgpu decal backend ready");

        Self {
            device,
            queue,
            pipelines,
            program_ready,
            textures,
            globals,
            vertex_buffer,
            index_buffer,
            batch: QuadBatch::new(max_quads),
            uniforms,
            shared: SharedBindings::default(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    /// Register an engine-owned texture (terrain shading, shadow map, info
    /// overlay) so it can be named in `SharedBindings`.
    pub fn register_view(&mut self, view: wgpu::TextureView, kind: TextureKind) -> TextureHandle {
        self.textures.register_view(view, kind)
    }

    pub fn set_view_proj(&mut self, view_proj: Mat4) {
        self.uniforms.set_view_proj(view_proj);
    }

    pub fn set_map_size(&mut self, width: f32, depth: f32) {
        self.uniforms.set_map_size(width, depth);
    }

    /// Quads staged since the last `bind_shared`.
    pub fn staged(&self) -> &QuadBatch {
        &self.batch
    }

    fn shared_bind_group(&self) -> wgpu::BindGroup {
        let textures = &self.textures;
        let shadow = self.shared.shadow;
        let shading = textures
            .view(self.shared.shading, TextureKind::Color)
            .unwrap_or(&textures.white);
        let info = textures
            .view(self.shared.info, TextureKind::Color)
            .unwrap_or(&textures.white);
        let shadow_depth = textures
            .view(shadow.map(|s| s.depth), TextureKind::Depth)
            .unwrap_or(&textures.unshadowed);
        let shadow_color = textures
            .view(shadow.map(|s| s.color), TextureKind::Color)
            .unwrap_or(&textures.white);

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("decal-shared"),
            layout: &self.pipelines.shared_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shading),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(info),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(shadow_depth),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(shadow_color),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&textures.linear_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::Sampler(&textures.shadow_sampler),
                },
            ],
        })
    }

    /// Draw everything staged this frame on top of `color`/`depth`. The
    /// staged batch is consumed.
    pub fn submit(
        &mut self,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
    ) -> Result<SubmitStats, RenderError> {
        if !self.program_ready {
            return Err(RenderError::ProgramNotReady);
        }

        let mut stats = SubmitStats {
            dropped_quads: self.batch.dropped(),
            ..SubmitStats::default()
        };
        if self.batch.is_empty() {
            self.batch.clear();
            return Ok(stats);
        }

        self.queue
            .write_buffer(&self.globals, 0, bytemuck::bytes_of(&self.uniforms));
        self.queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(self.batch.vertices()),
        );
        let shared = self.shared_bind_group();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("decal-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("decal-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.set_bind_group(0, &shared, &[]);

            let mut pipeline: Option<DecalPass> = None;
            for run in self.batch.runs() {
                let Some(material) = self.textures.material(run.texture) else {
                    warn!(texture = ?run.texture, "unknown decal texture, run skipped");
                    stats.skipped_runs += 1;
                    continue;
                };
                if pipeline != Some(run.pass) {
                    pass.set_pipeline(self.pipelines.for_pass(run.pass));
                    pipeline = Some(run.pass);
                }
                pass.set_bind_group(1, material, &[]);
                pass.draw_indexed(run.index_range(), 0, 0..1);
                stats.draw_calls += 1;
                stats.quads += run.quad_count as usize;
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.batch.clear();

        trace!(
            draw_calls = stats.draw_calls,
            quads = stats.quads,
            dropped = stats.dropped_quads,
            "decals submitted"
        );
        Ok(stats)
    }
}

impl DecalDrawBackend for WgpuDecalBackend {
    fn program_ready(&self) -> bool {
        self.program_ready
    }

    fn bind_shared(&mut self, bindings: &SharedBindings) {
        self.batch.clear();
        self.shared = *bindings;
        self.uniforms.apply_bindings(bindings);
    }

    fn begin_pass(&mut self, pass: DecalPass) {
        self.batch.begin_pass(pass);
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.batch.bind_texture(texture);
    }

    fn draw_quads(&mut self, vertices: &[DecalVertex], offset: Vec3) {
        self.batch.push_quads(vertices, offset);
    }

    fn unbind(&mut self) {
        trace!(quads = self.batch.quad_count(), "decal frame staged");
    }

    fn set_sun(&mut self, sun: &SunLighting) {
        self.uniforms.set_sun(sun);
    }
}

impl TextureUploader for WgpuDecalBackend {
    fn upload_rgba(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        mipmaps: bool,
    ) -> Result<TextureHandle, AssetError> {
        self.textures.upload_rgba(
            &self.device,
            &self.queue,
            &self.pipelines.material_layout,
            label,
            width,
            height,
            pixels,
            mipmaps,
        )
    }
}
