//! Decal program and the two depth-biased pipelines built from it

use groundmark_core::geometry::DecalVertex;
use groundmark_core::render::DecalPass;
use wgpu::{BindGroupLayout, RenderPipeline};

/// Formats of the attachments decals are drawn into.
#[derive(Debug, Clone, Copy)]
pub struct TargetFormats {
    pub color: wgpu::TextureFormat,
    pub depth: wgpu::TextureFormat,
}

impl Default for TargetFormats {
    fn default() -> Self {
        Self {
            color: wgpu::TextureFormat::Rgba8UnormSrgb,
            depth: wgpu::TextureFormat::Depth32Float,
        }
    }
}

pub fn depth_bias_state(pass: DecalPass) -> wgpu::DepthBiasState {
    let bias = pass.depth_bias();
    wgpu::DepthBiasState {
        constant: bias.constant,
        slope_scale: bias.slope_scale,
        clamp: 0.0,
    }
}

pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Unorm8x4];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<DecalVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

pub struct DecalPipelines {
    pub shared_layout: BindGroupLayout,
    pub material_layout: BindGroupLayout,
    object_decals: RenderPipeline,
    scars: RenderPipeline,
}

impl DecalPipelines {
    pub fn new(device: &wgpu::Device, formats: TargetFormats) -> Self {
        let color = wgpu::TextureSampleType::Float { filterable: true };

        let shared_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("decal-shared-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1, color),
                texture_entry(2, color),
                texture_entry(3, wgpu::TextureSampleType::Depth),
                texture_entry(4, color),
                sampler_entry(5, wgpu::SamplerBindingType::Filtering),
                sampler_entry(6, wgpu::SamplerBindingType::Comparison),
            ],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("decal-material-bgl"),
            entries: &[
                texture_entry(0, color),
                sampler_entry(1, wgpu::SamplerBindingType::Filtering),
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("decal-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/decal.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("decal-pipeline-layout"),
            bind_group_layouts: &[&shared_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let build = |pass: DecalPass, label: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: formats.color,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: formats.depth,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: depth_bias_state(pass),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        };

        let object_decals = build(DecalPass::ObjectDecals, "object-decal-pipeline");
        let scars = build(DecalPass::Scars, "scar-pipeline");

        Self {
            shared_layout,
            material_layout,
            object_decals,
            scars,
        }
    }

    pub fn for_pass(&self, pass: DecalPass) -> &RenderPipeline {
        match pass {
            DecalPass::ObjectDecals => &self.object_decals,
            DecalPass::Scars => &self.scars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_bias_maps_onto_pipeline_state() {
        let objects = depth_bias_state(DecalPass::ObjectDecals);
        assert_eq!(objects.constant, -200);
        assert_eq!(objects.slope_scale, -10.0);
        assert_eq!(depth_bias_state(DecalPass::Scars).constant, -400);
    }

    #[test]
    fn vertex_layout_covers_the_whole_vertex() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 24);
        let last = layout.attributes.last().unwrap();
        assert_eq!(last.offset + last.format.size(), layout.array_stride);
    }
}
