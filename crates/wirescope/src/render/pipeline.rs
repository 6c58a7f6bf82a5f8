//! # Pipeline — Render Pipelines and Bind Group Layouts
//!
//! Four pipelines draw the model, all sharing the 48-byte [`Vertex`]
//! layout, the `Depth32Float` depth buffer and `Less` depth compare:
//!
//! | Pipeline  | Topology      | Shader                      | Group 0                          |
//! |-----------|---------------|-----------------------------|----------------------------------|
//! | line      | LineList      | `line.wgsl`                 | [`LineUniform`]                  |
//! | colored   | TriangleList  | `solid.wgsl` / `fs_colored` | [`SolidUniform`]                 |
//! | textured  | TriangleList  | `solid.wgsl` / `fs_textured`| uniform + sampler + base color   |
//! | pbr       | TriangleList  | `pbr.wgsl`                  | uniform + sampler + 6 textures   |
//!
//! The axis gizmo has its own pipeline in [`axis`](super::axis).
//!
//! Nothing is culled: open meshes show their back faces.
//!
//! ## PBR Availability
//!
//! The PBR pipeline is built inside a validation error scope. If the driver
//! rejects it, [`PbrPipeline::new`] returns `None` and the renderer draws
//! with the Lambert pipelines instead.
//!
//! ## Comparison
//!
//! - **Bevy**: specializes one mesh pipeline per key (wireframe, unlit,
//!   vertex colors…) through a pipeline cache.
//! - **Our approach**: a fixed set built once at startup; switching modes is
//!   choosing which one to bind.

use super::vertex::{LineUniform, SolidUniform, Vertex};

/// Depth texture format used by every depth-tested pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Create a depth buffer matching the surface size.
pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

// ── Layout entries ──────────────────────────────────────────────────────

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

const VERTEX_FRAGMENT: wgpu::ShaderStages = wgpu::ShaderStages::VERTEX_FRAGMENT;

// ── Shared pipeline builder ─────────────────────────────────────────────

struct MeshPipelineDesc<'a> {
    label: &'a str,
    layout: &'a wgpu::BindGroupLayout,
    shader: &'a wgpu::ShaderModule,
    fragment_entry: &'a str,
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
}

fn mesh_pipeline(device: &wgpu::Device, desc: MeshPipelineDesc<'_>) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: &[desc.layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some(desc.fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ── Line ────────────────────────────────────────────────────────────────

/// Flat-colored line-list pipeline for the wireframe and normal overlay.
pub struct LinePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LinePipeline {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("line layout"),
            entries: &[uniform_entry(0, VERTEX_FRAGMENT)],
        });
        let pipeline = mesh_pipeline(
            device,
            MeshPipelineDesc {
                label: "line pipeline",
                layout: &bind_group_layout,
                shader: &shader,
                fragment_entry: "fs_main",
                topology: wgpu::PrimitiveTopology::LineList,
                format,
            },
        );
        Self {
            pipeline,
            bind_group_layout,
        }
    }
}

/// A [`LineUniform`] buffer and its bind group. The wireframe and the normal
/// overlay each own one so their colors never overwrite each other.
pub struct LineBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl LineBinding {
    pub fn new(device: &wgpu::Device, pipeline: &LinePipeline, label: &str) -> Self {
        let buffer = super::texture::uniform_buffer(
            device,
            label,
            bytemuck::bytes_of(&<LineUniform as bytemuck::Zeroable>::zeroed()),
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &pipeline.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniform: &LineUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }
}

// ── Solid (Lambert) ─────────────────────────────────────────────────────

/// The fallback Lambert pipelines. `textured` is used when the mesh has a
/// base color map, `colored` otherwise.
pub struct SolidPipelines {
    pub colored: wgpu::RenderPipeline,
    pub textured: wgpu::RenderPipeline,
    pub colored_layout: wgpu::BindGroupLayout,
    pub textured_layout: wgpu::BindGroupLayout,
    pub uniform_buffer: wgpu::Buffer,
    pub colored_bind_group: wgpu::BindGroup,
}

impl SolidPipelines {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("solid shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/solid.wgsl").into()),
        });
        let colored_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("solid colored layout"),
            entries: &[uniform_entry(0, VERTEX_FRAGMENT)],
        });
        let textured_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("solid textured layout"),
            entries: &[uniform_entry(0, VERTEX_FRAGMENT), sampler_entry(1), texture_entry(2)],
        });

        let colored = mesh_pipeline(
            device,
            MeshPipelineDesc {
                label: "solid colored pipeline",
                layout: &colored_layout,
                shader: &shader,
                fragment_entry: "fs_colored",
                topology: wgpu::PrimitiveTopology::TriangleList,
                format,
            },
        );
        let textured = mesh_pipeline(
            device,
            MeshPipelineDesc {
                label: "solid textured pipeline",
                layout: &textured_layout,
                shader: &shader,
                fragment_entry: "fs_textured",
                topology: wgpu::PrimitiveTopology::TriangleList,
                format,
            },
        );

        let uniform_buffer = super::texture::uniform_buffer(
            device,
            "solid uniform",
            bytemuck::bytes_of(&<SolidUniform as bytemuck::Zeroable>::zeroed()),
        );
        let colored_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("solid colored bind group"),
            layout: &colored_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            colored,
            textured,
            colored_layout,
            textured_layout,
            uniform_buffer,
            colored_bind_group,
        }
    }

    /// Bind group for the textured variant over `base_color`.
    pub fn textured_bind_group(
        &self,
        device: &wgpu::Device,
        sampler: &wgpu::Sampler,
        base_color: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("solid textured bind group"),
            layout: &self.textured_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(base_color),
                },
            ],
        })
    }
}

// ── PBR ─────────────────────────────────────────────────────────────────

/// Texture views bound to the PBR pass, in binding order 2..=7.
pub struct PbrViews<'a> {
    pub base_color: &'a wgpu::TextureView,
    pub metallic_roughness: &'a wgpu::TextureView,
    pub normal: &'a wgpu::TextureView,
    pub matcap: &'a wgpu::TextureView,
    pub brdf_lut: &'a wgpu::TextureView,
    pub occlusion: &'a wgpu::TextureView,
}

pub struct PbrPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl PbrPipeline {
    /// Build the PBR pipeline, or `None` if shader or pipeline validation
    /// fails on this device.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Option<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pbr shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pbr.wgsl").into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pbr layout"),
            entries: &[
                uniform_entry(0, VERTEX_FRAGMENT),
                sampler_entry(1),
                texture_entry(2),
                texture_entry(3),
                texture_entry(4),
                texture_entry(5),
                texture_entry(6),
                texture_entry(7),
            ],
        });
        let pipeline = mesh_pipeline(
            device,
            MeshPipelineDesc {
                label: "pbr pipeline",
                layout: &bind_group_layout,
                shader: &shader,
                fragment_entry: "fs_main",
                topology: wgpu::PrimitiveTopology::TriangleList,
                format,
            },
        );

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            log::warn!("PBR pipeline unavailable, using Lambert shading: {err}");
            return None;
        }
        Some(Self {
            pipeline,
            bind_group_layout,
        })
    }

    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        uniform: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        views: PbrViews<'_>,
    ) -> wgpu::BindGroup {
        let texture = |binding: u32, view| wgpu::BindGroupEntry {
            binding,
            resource: wgpu::BindingResource::TextureView(view),
        };
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pbr bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                texture(2, views.base_color),
                texture(3, views.metallic_roughness),
                texture(4, views.normal),
                texture(5, views.matcap),
                texture(6, views.brdf_lut),
                texture(7, views.occlusion),
            ],
        })
    }
}
