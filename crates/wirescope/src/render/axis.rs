//! # Axis Gizmo — Orientation Indicator
//!
//! Three colored unit lines drawn in a small square viewport in the
//! lower-left corner, after the main pass:
//!
//! ```text
//!   ┌──────────────────────────────────┐
//!   │                                  │
//!   │                                  │
//!   │  Z                               │
//!   │  │  ← 100 px square              │
//!   │  └── X                           │
//!   │ ↕ 10 px margin                   │
//!   └──────────────────────────────────┘
//! ```
//!
//! The gizmo uses the camera's view rotation with the translation replaced by
//! a fixed step back along view Z, so it turns with the camera but never
//! moves or zooms. Its projection is orthographic, squashing depth into a
//! thin slab. It does not use the depth buffer and loads the color target
//! as-is.
//!
//! Label anchors at 1.2 units along each axis are projected to viewport
//! pixels each frame so a host UI can place "X", "Y" and "Z" text.

use super::gpu::GraphicsContext;
use super::vertex::{AxisUniform, AxisVertex};
use crate::math::{Mat4, Vec2, Vec3, Vec4};

/// Viewport edge length in logical pixels.
pub const AXIS_SIZE: f32 = 100.0;
/// Gap to the window's left and bottom edges in logical pixels.
pub const AXIS_MARGIN: f32 = 10.0;
/// Distance of the label anchors from the origin.
pub const LABEL_DISTANCE: f32 = 1.2;

const X_COLOR: [f32; 3] = [1.0, 0.0, 0.0];
const Y_COLOR: [f32; 3] = [0.0, 1.0, 0.0];
const Z_COLOR: [f32; 3] = [0.0, 0.5, 1.0];

pub const AXIS_VERTICES: [AxisVertex; 6] = [
    AxisVertex { position: [0.0, 0.0, 0.0], color: X_COLOR },
    AxisVertex { position: [1.0, 0.0, 0.0], color: X_COLOR },
    AxisVertex { position: [0.0, 0.0, 0.0], color: Y_COLOR },
    AxisVertex { position: [0.0, 1.0, 0.0], color: Y_COLOR },
    AxisVertex { position: [0.0, 0.0, 0.0], color: Z_COLOR },
    AxisVertex { position: [0.0, 0.0, 1.0], color: Z_COLOR },
];

/// The camera view with its translation replaced by a step of 3 back.
pub fn gizmo_view(camera_view: Mat4) -> Mat4 {
    let mut view = camera_view;
    view.w_axis = Vec4::new(0.0, 0.0, -3.0, 1.0);
    view
}

pub fn gizmo_projection() -> Mat4 {
    Mat4::from_diagonal(Vec4::new(1.0, 1.0, -0.01, 1.0))
}

/// Pixel positions of the axis labels inside the gizmo viewport, origin at
/// its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisLabels {
    pub x: Vec2,
    pub y: Vec2,
    pub z: Vec2,
}

/// Project a gizmo-space point to pixels in a `size`-wide square viewport.
pub fn project_to_viewport(point: Vec3, view: Mat4, projection: Mat4, size: f32) -> Vec2 {
    let clip = projection * view * point.extend(1.0);
    let ndc = clip.truncate().truncate() / clip.w;
    Vec2::new((ndc.x + 1.0) * 0.5 * size, (1.0 - ndc.y) * 0.5 * size)
}

pub fn label_positions(camera_view: Mat4) -> AxisLabels {
    let view = gizmo_view(camera_view);
    let proj = gizmo_projection();
    let project = |axis: Vec3| project_to_viewport(axis * LABEL_DISTANCE, view, proj, AXIS_SIZE);
    AxisLabels {
        x: project(Vec3::X),
        y: project(Vec3::Y),
        z: project(Vec3::Z),
    }
}

/// Physical-pixel viewport `(x, y, size)` for a surface `height` pixels tall,
/// or `None` when the surface is too small to hold it.
pub fn viewport(surface: (u32, u32), scale_factor: f32) -> Option<(f32, f32, f32)> {
    let size = AXIS_SIZE * scale_factor;
    let margin = AXIS_MARGIN * scale_factor;
    let (width, height) = (surface.0 as f32, surface.1 as f32);
    let y = height - size - margin;
    (margin + size <= width && y >= 0.0).then_some((margin, y, size))
}

/// GPU resources for the gizmo.
pub struct AxisGizmo {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    labels: AxisLabels,
}

impl AxisGizmo {
    pub fn new(gpu: &GraphicsContext) -> Self {
        use wgpu::util::DeviceExt;

        let device = &gpu.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("axis shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/axis.wgsl").into()),
        });
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("axis layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("axis pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("axis pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[AxisVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("axis vertices"),
            contents: bytemuck::cast_slice(&AXIS_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniform = AxisUniform {
            view: gizmo_view(Mat4::IDENTITY).to_cols_array_2d(),
            proj: gizmo_projection().to_cols_array_2d(),
        };
        let uniform_buffer = super::texture::uniform_buffer(device, "axis uniform", bytemuck::bytes_of(&uniform));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("axis bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            vertex_buffer,
            uniform_buffer,
            bind_group,
            labels: AxisLabels::default(),
        }
    }

    /// Label anchors from the most recent draw.
    pub fn labels(&self) -> AxisLabels {
        self.labels
    }

    /// Record the gizmo pass into `encoder`, on top of `target`.
    pub fn draw(
        &mut self,
        gpu: &GraphicsContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        camera_view: Mat4,
        scale_factor: f32,
    ) {
        let uniform = AxisUniform {
            view: gizmo_view(camera_view).to_cols_array_2d(),
            proj: gizmo_projection().to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        self.labels = label_positions(camera_view);

        let Some((x, y, size)) = viewport(gpu.surface_size(), scale_factor) else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("axis pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_viewport(x, y, size, size, 0.0, 1.0);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..AXIS_VERTICES.len() as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn gizmo_view_keeps_rotation_and_fixes_translation() {
        let camera = OrbitCamera::new();
        let view = gizmo_view(camera.view_matrix());
        assert_eq!(view.w_axis, Vec4::new(0.0, 0.0, -3.0, 1.0));
        assert_eq!(view.x_axis, camera.view_matrix().x_axis);
    }

    #[test]
    fn identity_view_labels() {
        let labels = label_positions(Mat4::IDENTITY);
        assert!(close(labels.x, Vec2::new(110.0, 50.0)), "{:?}", labels.x);
        assert!(close(labels.y, Vec2::new(50.0, -10.0)), "{:?}", labels.y);
        assert!(close(labels.z, Vec2::new(50.0, 50.0)), "{:?}", labels.z);
    }

    #[test]
    fn default_camera_shows_z_up_and_x_right() {
        let labels = label_positions(OrbitCamera::new().view_matrix());
        assert!(close(labels.x, Vec2::new(110.0, 50.0)), "{:?}", labels.x);
        assert!(close(labels.z, Vec2::new(50.0, -10.0)), "{:?}", labels.z);
        // Y points away from the camera, straight into the screen.
        assert!(close(labels.y, Vec2::new(50.0, 50.0)), "{:?}", labels.y);
    }

    #[test]
    fn projection_depth_stays_in_clip_range() {
        let view = gizmo_view(Mat4::IDENTITY);
        for v in AXIS_VERTICES {
            let clip = gizmo_projection() * view * Vec3::from(v.position).extend(1.0);
            let depth = clip.z / clip.w;
            assert!((0.0..=1.0).contains(&depth), "depth {depth}");
        }
    }

    #[test]
    fn viewport_sits_in_lower_left() {
        assert_eq!(viewport((800, 600), 1.0), Some((10.0, 490.0, 100.0)));
        assert_eq!(viewport((800, 600), 2.0), Some((20.0, 380.0, 200.0)));
        assert_eq!(viewport((50, 50), 1.0), None);
    }

    #[test]
    fn axis_colors() {
        assert_eq!(AXIS_VERTICES[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(AXIS_VERTICES[3].color, [0.0, 1.0, 0.0]);
        assert_eq!(AXIS_VERTICES[5].color, [0.0, 0.5, 1.0]);
    }
}
