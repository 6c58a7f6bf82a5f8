//! # Vertex & Uniform Layouts
//!
//! Every mesh, wireframe and normal-overlay draw shares one vertex format:
//!
//! ```text
//! Vertex (48 bytes)
//! ┌──────────────┬──────────────┬──────────────────┬──────────────┐
//! │ position     │ normal       │ color            │ uv           │
//! │ [f32; 3]     │ [f32; 3]     │ [f32; 4]         │ [f32; 2]     │
//! │ offset 0     │ offset 12    │ offset 24        │ offset 40    │
//! │ location(0)  │ location(1)  │ location(2)      │ location(3)  │
//! └──────────────┴──────────────┴──────────────────┴──────────────┘
//! ```
//!
//! The line pipelines read only `position`; the shaded pipelines read all four.
//! Sharing the layout means the wireframe pass can draw from the same vertex
//! buffer as the PBR pass, only swapping the index buffer.
//!
//! ## Uniform Blocks
//!
//! ```text
//!  LineUniform   mvp + color                                       80 bytes
//!  SolidUniform  mvp + model + base color factor                  144 bytes
//!  PbrUniform    mvp + model + view                               192
//!                camera pos + exposure                             16
//!                base color factor                                 16
//!                metallic, roughness, normal scale, render mode    16
//!                ibl, direct, occlusion strength, pad              16 → 256
//!  AxisUniform   view + proj                                      128 bytes
//! ```
//!
//! ## Comparison
//!
//! - **Bevy**: flexible `MeshVertexBufferLayout` with optional attributes.
//! - **glTF**: our four attributes are POSITION, NORMAL, COLOR_0, TEXCOORD_0.

use bytemuck::{Pod, Zeroable};

/// Per-vertex data: position, normal, RGBA color and UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 40,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// Gizmo line vertex: position + RGB color.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AxisVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl AxisVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<AxisVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };
}

/// Wireframe and normal-overlay uniform.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LineUniform {
    pub mvp: [[f32; 4]; 4], // 64 bytes
    pub color: [f32; 4],    // 16 bytes → 80
}

/// Legacy Lambert solid uniform (flat-colored and textured variants).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SolidUniform {
    pub mvp: [[f32; 4]; 4],          // 64 bytes
    pub model: [[f32; 4]; 4],        // 64 bytes
    pub base_color_factor: [f32; 4], // 16 bytes → 144
}

/// PBR pass uniform. Field order mirrors the WGSL `PbrUniform` struct.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PbrUniform {
    pub mvp: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub exposure: f32,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub normal_scale: f32,
    /// 0 = PBR, 1..=6 = channel views.
    pub render_mode: u32,
    pub ibl_intensity: f32,
    pub direct_intensity: f32,
    pub occlusion_strength: f32,
    pub _pad: f32,
}

/// Axis gizmo uniform.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct AxisUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
}
