//! GPU textures addressed by `TextureHandle`

use crate::mips::{mip_chain, mip_level_count};
use groundmark_asset::AssetError;
use groundmark_core::interfaces::TextureHandle;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Color,
    Depth,
}

struct Entry {
    view: wgpu::TextureView,
    kind: TextureKind,
    /// Bind group for drawing decals with this texture.
    material: Option<wgpu::BindGroup>,
}

/// Textures the decal backend knows about, plus stand-ins for optional
/// shared bindings.
pub struct TextureRegistry {
    entries: HashMap<TextureHandle, Entry>,
    next: u64,
    pub(crate) linear_sampler: wgpu::Sampler,
    pub(crate) shadow_sampler: wgpu::Sampler,
    pub(crate) white: wgpu::TextureView,
    pub(crate) unshadowed: wgpu::TextureView,
}

impl TextureRegistry {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("decal-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("decal-shadow-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let white = upload_level_zero(device, queue, "decal-white", 1, 1, &[255; 4], 1)
            .create_view(&wgpu::TextureViewDescriptor::default());
        let unshadowed = cleared_depth(device, queue);

        Self {
            entries: HashMap::new(),
            next: 1,
            linear_sampler,
            shadow_sampler,
            white,
            unshadowed,
        }
    }

    fn issue(&mut self) -> TextureHandle {
        let handle = TextureHandle(self.next);
        self.next += 1;
        handle
    }

    /// Register a texture owned elsewhere (terrain shading, shadow map, ...).
    pub fn register_view(&mut self, view: wgpu::TextureView, kind: TextureKind) -> TextureHandle {
        let handle = self.issue();
        self.entries.insert(
            handle,
            Entry {
                view,
                kind,
                material: None,
            },
        );
        handle
    }

    /// Create a sampled RGBA texture and its material bind group.
    #[allow(clippy::too_many_arguments)]
    pub fn upload_rgba(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        mipmaps: bool,
    ) -> Result<TextureHandle, AssetError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(AssetError::Dimensions {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(AssetError::Upload(format!(
                "{label}: {width}x{height} exceeds device limit {max}"
            )));
        }

        let levels = if mipmaps { mip_level_count(width, height) } else { 1 };
        let texture = upload_level_zero(device, queue, label, width, height, pixels, levels);
        if mipmaps {
            for (level, mip) in mip_chain(width, height, pixels).iter().enumerate() {
                write_level(queue, &texture, level as u32 + 1, mip.width, mip.height, &mip.pixels);
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let material = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.linear_sampler),
                },
            ],
        });

        let handle = self.issue();
        trace!(?handle, label, width, height, levels, "texture uploaded");
        self.entries.insert(
            handle,
            Entry {
                view,
                kind: TextureKind::Color,
                material: Some(material),
            },
        );
        Ok(handle)
    }

    pub fn material(&self, handle: TextureHandle) -> Option<&wgpu::BindGroup> {
        self.entries.get(&handle)?.material.as_ref()
    }

    /// View of `handle` when it exists and has the requested kind.
    pub fn view(&self, handle: Option<TextureHandle>, kind: TextureKind) -> Option<&wgpu::TextureView> {
        let entry = self.entries.get(&handle?)?;
        (entry.kind == kind).then_some(&entry.view)
    }

    pub fn release(&mut self, handle: TextureHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn upload_level_zero(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
    mip_level_count: u32,
) -> wgpu::Texture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_level(queue, &texture, 0, width, height, pixels);
    texture
}

fn write_level(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    mip_level: u32,
    width: u32,
    height: u32,
    pixels: &[u8],
) {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
}

/// 1x1 depth texture at the far plane; every comparison passes.
fn cleared_depth(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("decal-unshadowed"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("decal-unshadowed-clear"),
    });
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("decal-unshadowed-clear"),
        color_attachments: &[],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    queue.submit(std::iter::once(encoder.finish()));

    view
}
