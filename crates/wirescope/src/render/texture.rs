//! # Texture — Material Maps and Procedural Lookups
//!
//! The PBR pass always binds the same eight resources. Whatever the asset
//! leaves out is filled from a fixed set of defaults built once at startup:
//!
//! | Slot               | Default         | Effect                              |
//! |--------------------|-----------------|-------------------------------------|
//! | base color         | 1×1 white       | vertex color × factor pass through  |
//! | metallic-roughness | 1×1 white       | G and B are 1, factors used as-is   |
//! | normal             | 1×1 (128,128,255) | flat tangent-space normal         |
//! | occlusion          | 1×1 white       | no occlusion                        |
//! | matcap             | 128² chrome     | studio sphere with horizon band     |
//! | BRDF LUT           | 128² RG         | split-sum scale (R) and bias (G)    |
//!
//! Every texture is `Rgba8Unorm`. The shaders do their own gamma, so
//! nothing is decoded from sRGB on sample.
//!
//! ## BRDF Lookup Table
//!
//! ```text
//!   roughness ▲
//!        1.0  │  scale ↓, bias ↓
//!             │
//!             │
//!        0.0  │  scale ≈ 1 at grazing-free angles
//!             └──────────────────────▶ N·V
//!            0.0                    1.0
//! ```
//!
//! Each texel integrates the GGX specular lobe with 64 Hammersley samples.
//! The fragment shader reads it at `(N·V, roughness)` and reconstructs the
//! specular response as `F0 · scale + bias`.
//!
//! ## Comparison
//!
//! - **Bevy**: ships a precomputed environment-map LUT as a KTX2 asset.
//! - **Filament**: bakes the DFG term offline with `cmgen`.
//! - **Our approach**: both procedural tables are computed on the CPU at
//!   startup in a few milliseconds and never touch the disk.

use wgpu::util::DeviceExt;

use super::gpu::GraphicsContext;
use crate::asset::DecodedImage;
use crate::math::Vec3;

/// Edge length of the generated matcap.
pub const MATCAP_SIZE: u32 = 128;
/// Edge length of the generated BRDF table.
pub const BRDF_LUT_SIZE: u32 = 128;
/// Importance samples per BRDF table texel.
pub const BRDF_SAMPLES: u32 = 64;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];

/// An uploaded texture and its default view.
pub struct TextureEntry {
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl TextureEntry {
    /// Upload tightly packed RGBA8 texels.
    pub fn from_rgba8(gpu: &GraphicsContext, label: &str, width: u32, height: u32, data: &[u8]) -> Self {
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            width,
            height,
        }
    }

    pub fn from_image(gpu: &GraphicsContext, label: &str, image: &DecodedImage) -> Self {
        log::debug!("uploading {label}: {}x{}", image.width, image.height);
        Self::from_rgba8(gpu, label, image.width, image.height, &image.rgba)
    }
}

/// Fallback maps and procedural tables, created once and shared by every
/// mesh upload.
pub struct DefaultTextures {
    pub base_color: TextureEntry,
    pub metallic_roughness: TextureEntry,
    pub normal: TextureEntry,
    pub occlusion: TextureEntry,
    pub matcap: TextureEntry,
    pub brdf_lut: TextureEntry,
}

impl DefaultTextures {
    pub fn new(gpu: &GraphicsContext) -> Self {
        let textures = Self {
            base_color: TextureEntry::from_rgba8(gpu, "default base color", 1, 1, &WHITE),
            metallic_roughness: TextureEntry::from_rgba8(gpu, "default metallic-roughness", 1, 1, &WHITE),
            normal: TextureEntry::from_rgba8(gpu, "default normal", 1, 1, &FLAT_NORMAL),
            occlusion: TextureEntry::from_rgba8(gpu, "default occlusion", 1, 1, &WHITE),
            matcap: TextureEntry::from_rgba8(
                gpu,
                "matcap",
                MATCAP_SIZE,
                MATCAP_SIZE,
                &matcap_pixels(MATCAP_SIZE),
            ),
            brdf_lut: TextureEntry::from_rgba8(
                gpu,
                "brdf lut",
                BRDF_LUT_SIZE,
                BRDF_LUT_SIZE,
                &brdf_lut_pixels(BRDF_LUT_SIZE),
            ),
        };
        log::debug!("default textures created (matcap {MATCAP_SIZE}², brdf lut {BRDF_LUT_SIZE}²)");
        textures
    }
}

/// The sampler shared by every material texture.
pub fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("material sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// A small uniform buffer initialised with `contents`.
pub(crate) fn uniform_buffer(device: &wgpu::Device, label: &str, contents: &[u8]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

// ── Matcap ──────────────────────────────────────────────────────────────

/// RGBA8 texels of a chrome sphere in a studio environment. The first rows
/// reflect a dark floor, the middle a glowing horizon band and the last rows
/// a bright softbox, with one sharp point highlight. Texels outside the
/// sphere are opaque black.
pub fn matcap_pixels(size: u32) -> Vec<u8> {
    let light = Vec3::new(0.4, -0.7, 0.6).normalize();
    let span = (size.max(2) - 1) as f32;
    let mut data = Vec::with_capacity((size * size * 4) as usize);

    for y in 0..size {
        for x in 0..size {
            let nx = x as f32 / span * 2.0 - 1.0;
            let ny = y as f32 / span * 2.0 - 1.0;
            let dist = (nx * nx + ny * ny).sqrt();
            if dist > 1.0 {
                data.extend_from_slice(&[0, 0, 0, 255]);
                continue;
            }
            let nz = (1.0 - dist * dist).sqrt();
            // +1 on the first row, -1 on the last.
            let ry = -ny;

            let environment = if ry < -0.3 {
                let t = (-ry - 0.3) / 0.7;
                0.7 + t * 0.5
            } else if ry < 0.1 {
                let glow = (-(ry + 0.1).powi(2) * 20.0).exp();
                0.5 + glow * 0.8
            } else {
                let t = (ry - 0.1) / 0.9;
                0.5 - t * 0.4
            };

            let n = Vec3::new(nx, -ny, nz);
            let reflected = 2.0 * n.dot(light) * n - light;
            let specular = reflected.z.max(0.0).powi(64) * 1.5;
            let brightness = (environment + specular).min(1.0);

            data.extend_from_slice(&[
                (brightness * 240.0).min(255.0) as u8,
                (brightness * 245.0).min(255.0) as u8,
                (brightness * 255.0).min(255.0) as u8,
                255,
            ]);
        }
    }
    data
}

// ── BRDF integration ────────────────────────────────────────────────────

/// Low-discrepancy point `i` of `count` on the unit square.
fn hammersley(i: u32, count: u32) -> (f32, f32) {
    let radical_inverse = i.reverse_bits() as f32 * 2.328_306_4e-10;
    (i as f32 / count as f32, radical_inverse)
}

/// Split-sum scale and bias for one `(N·V, roughness)` pair, integrated over
/// `samples` GGX-distributed half vectors.
pub fn integrate_brdf(n_dot_v: f32, roughness: f32, samples: u32) -> (f32, f32) {
    let alpha = roughness * roughness;
    let alpha2 = alpha * alpha;
    let view = Vec3::new((1.0 - n_dot_v * n_dot_v).max(0.0).sqrt(), 0.0, n_dot_v);
    let k = alpha / 2.0;
    let smith = |cos: f32| cos / (cos * (1.0 - k) + k);

    let (mut scale, mut bias) = (0.0, 0.0);
    for i in 0..samples {
        let (xi1, xi2) = hammersley(i, samples);
        let phi = std::f32::consts::TAU * xi1;
        let cos_theta = ((1.0 - xi2) / (1.0 + (alpha2 - 1.0) * xi2)).sqrt();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let half = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

        let v_dot_h = view.dot(half);
        let light = 2.0 * v_dot_h * half - view;
        let n_dot_l = light.z.max(0.0);
        let n_dot_h = half.z.max(0.0);

        if n_dot_l > 0.0 {
            let g = smith(n_dot_v) * smith(n_dot_l);
            let g_vis = g * v_dot_h / (n_dot_h * n_dot_v + 0.0001);
            let fc = (1.0 - v_dot_h).powi(5);
            scale += (1.0 - fc) * g_vis;
            bias += fc * g_vis;
        }
    }
    (scale / samples as f32, bias / samples as f32)
}

/// RGBA8 texels of the BRDF table: x is N·V, y is roughness, both sampled at
/// texel centers. R holds the scale, G the bias.
pub fn brdf_lut_pixels(size: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        let roughness = (y as f32 + 0.5) / size as f32;
        for x in 0..size {
            let n_dot_v = (x as f32 + 0.5) / size as f32;
            let (scale, bias) = integrate_brdf(n_dot_v, roughness, BRDF_SAMPLES);
            data.extend_from_slice(&[unorm8(scale), unorm8(bias), 0, 255]);
        }
    }
    data
}

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}
