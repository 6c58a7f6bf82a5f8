//! # Renderer — Frame Composition
//!
//! Owns every pipeline and the GPU copy of the current mesh, and records one
//! frame per [`Renderer::render`] call:
//!
//! ```text
//!  main pass (clear background, clear depth 1.0)
//!    ├─ wireframe?      line pipeline   + edge indices
//!    ├─ else PBR?       pbr pipeline    + triangle indices
//!    └─ else            Lambert colored / textured + triangle indices
//!    └─ vertex normals? line pipeline   + normal segments (magenta)
//!  axis pass (load, own viewport, no depth)
//!  submit, present
//! ```
//!
//! Nothing is drawn, not even the clear, until a mesh has been uploaded.
//!
//! ## Material Binding
//!
//! Textures of the mesh's first material are uploaded once per mesh. Absent
//! maps fall back to the neutral defaults in [`DefaultTextures`], so the PBR
//! bind group is always complete. The PBR base color factor is `[1, 1, 1, 1]`
//! because factors are already baked into vertex colors; the Lambert textured
//! path multiplies by the material factor instead.
//!
//! A `KHR_materials_unlit` material shows its gamma-encoded base color in
//! the final render, the same output as the base-color channel view.

use wgpu::util::DeviceExt;

use super::axis::{AxisGizmo, AxisLabels};
use super::gpu::GraphicsContext;
use super::pipeline::{
    LineBinding, LinePipeline, PbrPipeline, PbrViews, SolidPipelines, create_depth_texture,
};
use super::texture::{DefaultTextures, TextureEntry, create_sampler, uniform_buffer};
use super::vertex::{LineUniform, PbrUniform, SolidUniform, Vertex};
use crate::camera::OrbitCamera;
use crate::mesh::{Mesh, MeshStats, SurfaceMaterial};
use crate::settings::{RenderMode, RenderSettings, SettingsDelta, SettingsUpdate};

/// Normal overlay color.
pub const NORMAL_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// A vertex buffer or index buffer with its element count. Never empty:
/// wgpu rejects zero-length slices.
struct GpuBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl GpuBuffer {
    fn new<T: bytemuck::Pod>(
        device: &wgpu::Device,
        label: &str,
        data: &[T],
        usage: wgpu::BufferUsages,
    ) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage,
        });
        Some(Self {
            buffer,
            count: data.len() as u32,
        })
    }
}

/// The uploaded mesh and everything derived from it.
struct GpuMesh {
    /// CPU copy with textures stripped, kept to regenerate normal segments.
    source: Mesh,
    vertices: GpuBuffer,
    edges: Option<GpuBuffer>,
    triangles: Option<GpuBuffer>,
    normals: Option<GpuBuffer>,
    material: SurfaceMaterial,
    pbr_bind_group: Option<wgpu::BindGroup>,
    /// Present only when the mesh has a base color map.
    textured_bind_group: Option<wgpu::BindGroup>,
    legacy_base_color: [f32; 4],
}

pub struct Renderer {
    settings: RenderSettings,
    lines: LinePipeline,
    wire: LineBinding,
    normal_lines: LineBinding,
    solid: SolidPipelines,
    pbr: Option<PbrPipeline>,
    pbr_uniform: wgpu::Buffer,
    defaults: DefaultTextures,
    sampler: wgpu::Sampler,
    depth: wgpu::TextureView,
    depth_size: (u32, u32),
    axis: AxisGizmo,
    mesh: Option<GpuMesh>,
}

impl Renderer {
    pub fn new(gpu: &GraphicsContext) -> Self {
        Self::with_settings(gpu, RenderSettings::default())
    }

    pub fn with_settings(gpu: &GraphicsContext, settings: RenderSettings) -> Self {
        let device = &gpu.device;
        let format = gpu.surface_format();

        let lines = LinePipeline::new(device, format);
        let wire = LineBinding::new(device, &lines, "wireframe uniform");
        let normal_lines = LineBinding::new(device, &lines, "normal overlay uniform");
        let solid = SolidPipelines::new(device, format);
        let pbr = PbrPipeline::new(device, format);
        let pbr_uniform = uniform_buffer(
            device,
            "pbr uniform",
            bytemuck::bytes_of(&<PbrUniform as bytemuck::Zeroable>::zeroed()),
        );

        let depth_size = gpu.surface_size();
        let depth = create_depth_texture(device, depth_size.0, depth_size.1);

        log::info!(
            "renderer ready: shading {}",
            if pbr.is_some() { "PBR" } else { "Lambert" }
        );

        Self {
            settings,
            lines,
            wire,
            normal_lines,
            solid,
            pbr,
            pbr_uniform,
            defaults: DefaultTextures::new(gpu),
            sampler: create_sampler(device),
            depth,
            depth_size,
            axis: AxisGizmo::new(gpu),
            mesh: None,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// False when the device rejected the PBR pipeline.
    pub fn has_pbr(&self) -> bool {
        self.pbr.is_some()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn mesh_stats(&self) -> Option<MeshStats> {
        self.mesh.as_ref().map(|m| m.source.stats())
    }

    /// Label anchors of the axis gizmo from the last rendered frame.
    pub fn axis_labels(&self) -> AxisLabels {
        self.axis.labels()
    }

    /// Replace the displayed mesh. Textures are uploaded here and dropped
    /// from the CPU copy.
    pub fn upload_mesh(&mut self, gpu: &GraphicsContext, mut mesh: Mesh) {
        let device = &gpu.device;
        let Some(vertices) =
            GpuBuffer::new(device, "mesh vertices", &mesh.vertices, wgpu::BufferUsages::VERTEX)
        else {
            log::warn!("refusing to upload a mesh without vertices");
            return;
        };
        let textures = std::mem::take(&mut mesh.textures);

        let upload = |label: &str, image: &Option<crate::asset::DecodedImage>| {
            image.as_ref().map(|image| TextureEntry::from_image(gpu, label, image))
        };
        let base_color = upload("base color texture", &textures.base_color);
        let metallic_roughness = upload("metallic-roughness texture", &textures.metallic_roughness);
        let normal = upload("normal texture", &textures.normal);
        let occlusion = upload("occlusion texture", &textures.occlusion);

        let pbr_bind_group = self.pbr.as_ref().map(|pbr| {
            pbr.bind_group(
                device,
                &self.pbr_uniform,
                &self.sampler,
                PbrViews {
                    base_color: &base_color.as_ref().unwrap_or(&self.defaults.base_color).view,
                    metallic_roughness: &metallic_roughness
                        .as_ref()
                        .unwrap_or(&self.defaults.metallic_roughness)
                        .view,
                    normal: &normal.as_ref().unwrap_or(&self.defaults.normal).view,
                    matcap: &self.defaults.matcap.view,
                    brdf_lut: &self.defaults.brdf_lut.view,
                    occlusion: &occlusion.as_ref().unwrap_or(&self.defaults.occlusion).view,
                },
            )
        });
        let textured_bind_group = base_color
            .as_ref()
            .map(|tex| self.solid.textured_bind_group(device, &self.sampler, &tex.view));
        let legacy_base_color = if base_color.is_some() {
            mesh.material.base_color_factor
        } else {
            [1.0; 4]
        };

        let edges = GpuBuffer::new(device, "mesh edges", &mesh.edge_indices(), wgpu::BufferUsages::INDEX);
        let triangles = GpuBuffer::new(device, "mesh triangles", &mesh.triangles, wgpu::BufferUsages::INDEX);
        let normals = normal_buffer(device, &mesh, self.settings.normal_length);

        log::info!(
            "uploaded mesh: {} vertices, {} edge indices, {} triangle indices, textures: base={} mr={} normal={} ao={}",
            vertices.count,
            edges.as_ref().map_or(0, |b| b.count),
            triangles.as_ref().map_or(0, |b| b.count),
            base_color.is_some(),
            metallic_roughness.is_some(),
            normal.is_some(),
            occlusion.is_some(),
        );

        self.mesh = Some(GpuMesh {
            material: mesh.material,
            source: mesh,
            vertices,
            edges,
            triangles,
            normals,
            pbr_bind_group,
            textured_bind_group,
            legacy_base_color,
        });
    }

    /// Merge a settings update. Normal segments are rebuilt when their length
    /// changed; the returned delta tells the caller about camera-side effects.
    pub fn update_settings(&mut self, gpu: &GraphicsContext, update: SettingsUpdate) -> SettingsDelta {
        let delta = self.settings.apply(update);
        if delta.normals
            && let Some(mesh) = &mut self.mesh
        {
            mesh.normals = normal_buffer(&gpu.device, &mesh.source, self.settings.normal_length);
            log::debug!("normal overlay rebuilt at length {}", self.settings.normal_length);
        }
        delta
    }

    /// Resize the surface and recreate the depth buffer.
    pub fn resize(&mut self, gpu: &mut GraphicsContext, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        gpu.resize(width, height);
        self.ensure_depth(gpu);
    }

    fn ensure_depth(&mut self, gpu: &GraphicsContext) {
        let size = gpu.surface_size();
        if size != self.depth_size {
            self.depth = create_depth_texture(&gpu.device, size.0, size.1);
            self.depth_size = size;
        }
    }

    /// Draw one frame. Returns without touching the surface if no mesh is
    /// loaded.
    pub fn render(
        &mut self,
        gpu: &GraphicsContext,
        camera: &OrbitCamera,
        scale_factor: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        if self.mesh.is_none() {
            return Ok(());
        }
        self.ensure_depth(gpu);

        let output = gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("wirescope frame encoder"),
            });

        self.record_main_pass(gpu, camera, &mut encoder, &view);
        self.axis
            .draw(gpu, &mut encoder, &view, camera.view_matrix(), scale_factor);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn record_main_pass(
        &self,
        gpu: &GraphicsContext,
        camera: &OrbitCamera,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let Some(mesh) = &self.mesh else {
            return;
        };
        let mvp = camera.view_projection_matrix().to_cols_array_2d();
        let model = camera.model_matrix();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.settings.background_color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_vertex_buffer(0, mesh.vertices.buffer.slice(..));

        if self.settings.wireframe() {
            self.wire.write(
                &gpu.queue,
                &LineUniform {
                    mvp,
                    color: self.settings.wire_color.rgba(),
                },
            );
            if let Some(edges) = &mesh.edges {
                pass.set_pipeline(&self.lines.pipeline);
                pass.set_bind_group(0, &self.wire.bind_group, &[]);
                pass.set_index_buffer(edges.buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..edges.count, 0, 0..1);
            }
        } else if let (Some(pbr), Some(bind_group)) = (&self.pbr, &mesh.pbr_bind_group) {
            let uniform = PbrUniform {
                mvp,
                model: model.to_cols_array_2d(),
                view: camera.view_matrix().to_cols_array_2d(),
                camera_position: camera.position().to_array(),
                exposure: self.settings.exposure,
                base_color_factor: [1.0; 4],
                metallic_factor: mesh.material.metallic_factor,
                roughness_factor: mesh.material.roughness_factor,
                normal_scale: mesh.material.normal_scale,
                render_mode: shaded_mode(self.settings.render_mode, &mesh.material).index(),
                ibl_intensity: self.settings.ibl_intensity,
                direct_intensity: self.settings.direct_light_intensity,
                occlusion_strength: mesh.material.occlusion_strength,
                _pad: 0.0,
            };
            gpu.queue
                .write_buffer(&self.pbr_uniform, 0, bytemuck::bytes_of(&uniform));
            if let Some(triangles) = &mesh.triangles {
                pass.set_pipeline(&pbr.pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                pass.set_index_buffer(triangles.buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..triangles.count, 0, 0..1);
            }
        } else {
            let uniform = SolidUniform {
                mvp,
                model: model.to_cols_array_2d(),
                base_color_factor: mesh.legacy_base_color,
            };
            gpu.queue
                .write_buffer(&self.solid.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
            if let Some(triangles) = &mesh.triangles {
                match &mesh.textured_bind_group {
                    Some(bind_group) => {
                        pass.set_pipeline(&self.solid.textured);
                        pass.set_bind_group(0, bind_group, &[]);
                    }
                    None => {
                        pass.set_pipeline(&self.solid.colored);
                        pass.set_bind_group(0, &self.solid.colored_bind_group, &[]);
                    }
                }
                pass.set_index_buffer(triangles.buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..triangles.count, 0, 0..1);
            }
        }

        if self.settings.show_normals()
            && let Some(normals) = &mesh.normals
        {
            self.normal_lines.write(
                &gpu.queue,
                &LineUniform {
                    mvp,
                    color: NORMAL_COLOR,
                },
            );
            pass.set_pipeline(&self.lines.pipeline);
            pass.set_bind_group(0, &self.normal_lines.bind_group, &[]);
            pass.set_vertex_buffer(0, normals.buffer.slice(..));
            pass.draw(0..normals.count, 0..1);
        }
    }
}

/// Mode the PBR shader runs in. Unlit materials skip lighting.
pub fn shaded_mode(mode: RenderMode, material: &SurfaceMaterial) -> RenderMode {
    if material.unlit && mode == RenderMode::FinalRender {
        RenderMode::BaseColor
    } else {
        mode
    }
}

/// Segment length in world units for a `fraction` of the mesh radius.
pub fn normal_length(mesh: &Mesh, fraction: f32) -> f32 {
    fraction * mesh.radius
}

/// Line-list vertices of the normal overlay.
pub fn overlay_segments(mesh: &Mesh, fraction: f32) -> Vec<Vertex> {
    mesh.normal_segments(normal_length(mesh, fraction))
}

fn normal_buffer(device: &wgpu::Device, mesh: &Mesh, fraction: f32) -> Option<GpuBuffer> {
    let segments = overlay_segments(mesh, fraction);
    GpuBuffer::new(device, "normal segments", &segments, wgpu::BufferUsages::VERTEX)
}
