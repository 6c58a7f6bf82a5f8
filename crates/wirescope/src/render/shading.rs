//! # Shading — CPU Reference for the PBR Fragment Shader
//!
//! `shaders/pbr.wgsl` and this module compute the same per-fragment
//! quantities. The GPU version is what draws; this one is what the test
//! suite checks against, so a change to a constant or a clamp must land in
//! both places.
//!
//! ## Per-Fragment Flow
//!
//! ```text
//!  textures + vertex color + factors
//!            │
//!            ▼
//!     SurfaceInputs::resolve ── base color, metallic, roughness, ao, F0
//!            │
//!            ├── render mode 1..=6 ──▶ channel_output (no lighting)
//!            │
//!            └── render mode 0 ──▶ shade
//!                   key + fill + rim lights   (Cook-Torrance, direct k)
//!                   IBL diffuse + specular    (split sum, IBL k)
//!                   Fresnel rim
//!                   exposure → ACES → gamma
//! ```
//!
//! ## Comparison
//!
//! - **glTF sample viewer**: same BRDF terms, but real prefiltered cube maps
//!   instead of the analytic studio environment used here.
//! - **three.js** `MeshStandardMaterial`: same GGX/Smith/Schlick split, one
//!   ambient term from an irradiance probe.

use std::f32::consts::PI;

use crate::math::{Vec2, Vec3, Vec4};
use crate::settings::RenderMode;

/// Reflectance at normal incidence for non-metals.
pub const DIELECTRIC_F0: f32 = 0.04;
/// Lowest reflectance a metal may have, even when its base color is black.
pub const MIN_METAL_F0: f32 = 0.02;
/// Roughness floor; keeps the GGX lobe finite.
pub const MIN_ROUGHNESS: f32 = 0.04;
pub const GAMMA: f32 = 2.2;

/// A directional light of the fixed studio rig.
#[derive(Debug, Clone, Copy)]
pub struct StudioLight {
    pub direction: Vec3,
    pub color: Vec3,
    /// Multiplier on the direct-light intensity setting.
    pub weight: f32,
}

/// Key (warm, upper right), fill (cool, left) and rim (behind).
pub const STUDIO_LIGHTS: [StudioLight; 3] = [
    StudioLight {
        direction: Vec3::new(0.5, 0.7, 0.5),
        color: Vec3::new(1.0, 0.98, 0.95),
        weight: 0.5,
    },
    StudioLight {
        direction: Vec3::new(-0.7, 0.3, 0.4),
        color: Vec3::new(0.9, 0.95, 1.0),
        weight: 0.2,
    },
    StudioLight {
        direction: Vec3::new(0.0, 0.3, -0.9),
        color: Vec3::new(1.0, 1.0, 1.0),
        weight: 0.3,
    },
];

/// Material values after texture sampling, clamping and F0 derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceInputs {
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
    pub f0: Vec3,
}

/// Raw samples and factors feeding [`SurfaceInputs::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSamples {
    pub base_color_texel: Vec4,
    pub vertex_color: Vec4,
    pub base_color_factor: Vec4,
    pub metallic_roughness_texel: Vec4,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub occlusion_texel: Vec4,
    pub occlusion_strength: f32,
}

impl Default for SurfaceSamples {
    fn default() -> Self {
        Self {
            base_color_texel: Vec4::ONE,
            vertex_color: Vec4::ONE,
            base_color_factor: Vec4::ONE,
            metallic_roughness_texel: Vec4::ONE,
            metallic_factor: 0.0,
            roughness_factor: 0.8,
            occlusion_texel: Vec4::ONE,
            occlusion_strength: 1.0,
        }
    }
}

impl SurfaceInputs {
    pub fn resolve(s: &SurfaceSamples) -> Self {
        let base_color = s.base_color_texel * s.vertex_color * s.base_color_factor;
        // Metallic lives in blue, roughness in green.
        let metallic = (s.metallic_roughness_texel.z * s.metallic_factor).clamp(0.0, 1.0);
        let roughness = (s.metallic_roughness_texel.y * s.roughness_factor).clamp(MIN_ROUGHNESS, 1.0);
        let ao = lerp(1.0, s.occlusion_texel.x, s.occlusion_strength);
        let metal_f0 = base_color.truncate().max(Vec3::splat(MIN_METAL_F0));
        let f0 = Vec3::splat(DIELECTRIC_F0).lerp(metal_f0, metallic);
        Self {
            base_color,
            metallic,
            roughness,
            ao,
            f0,
        }
    }
}

/// The diagnostic output for channel modes 1..=6, or `None` for full PBR.
///
/// Color channels (base color, F0, matcap) are gamma encoded. Data channels
/// (metalness, roughness, occlusion) are written raw.
pub fn channel_output(mode: RenderMode, surface: &SurfaceInputs, matcap_texel: Vec4) -> Option<Vec4> {
    let gray = |v: f32| Vec4::new(v, v, v, 1.0);
    match mode {
        RenderMode::FinalRender => None,
        RenderMode::BaseColor => Some(gamma_encode(surface.base_color.truncate()).extend(1.0)),
        RenderMode::Metalness => Some(gray(surface.metallic)),
        RenderMode::Roughness => Some(gray(surface.roughness)),
        RenderMode::SpecularF0 => Some(gamma_encode(surface.f0).extend(1.0)),
        RenderMode::Matcap => Some(gamma_encode(matcap_texel.truncate()).extend(matcap_texel.w)),
        RenderMode::AmbientOcclusion => Some(gray(surface.ao)),
    }
}

/// Matcap texture coordinate for a view-space normal.
pub fn matcap_uv(view_normal: Vec3) -> Vec2 {
    let n = view_normal.normalize_or_zero();
    Vec2::new(n.x * 0.5 + 0.5, -n.y * 0.5 + 0.5)
}

pub fn gamma_encode(linear: Vec3) -> Vec3 {
    linear.max(Vec3::ZERO).powf(1.0 / GAMMA)
}

// ── BRDF terms ──────────────────────────────────────────────────────────

/// GGX normal distribution. `alpha` is roughness squared.
pub fn distribution_ggx(n_dot_h: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom + 0.0001)
}

/// Schlick-GGX for analytic lights, `k = (r + 1)² / 8`.
pub fn geometry_direct(n_dot_v: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    n_dot_v / (n_dot_v * (1.0 - k) + k + 0.0001)
}

/// Schlick-GGX for image-based light, `k = r² / 2`.
pub fn geometry_ibl(n_dot_v: f32, roughness: f32) -> f32 {
    let k = roughness * roughness / 2.0;
    n_dot_v / (n_dot_v * (1.0 - k) + k + 0.0001)
}

pub fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    geometry_direct(n_dot_v, roughness) * geometry_direct(n_dot_l, roughness)
}

pub fn fresnel_schlick(cos_theta: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

/// Fresnel for indirect light; rough surfaces cap the grazing reflectance.
pub fn fresnel_schlick_roughness(cos_theta: f32, f0: Vec3, roughness: f32) -> Vec3 {
    f0 + (Vec3::splat(1.0 - roughness).max(f0) - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

// ── Synthetic studio environment ────────────────────────────────────────

/// Irradiance from a softbox above, cool fill on the sides and a dark floor,
/// tinted by `base_color`.
pub fn ibl_diffuse(n: Vec3, base_color: Vec3) -> Vec3 {
    let up = n.y.max(0.0);
    let down = (-n.y).max(0.0);
    let side = 1.0 - n.y.abs();
    let irradiance = Vec3::new(1.0, 0.98, 0.95) * up * 0.5
        + Vec3::new(0.7, 0.73, 0.78) * side * 0.4
        + Vec3::new(0.2, 0.18, 0.16) * down * 0.2
        + Vec3::new(0.35, 0.37, 0.40);
    base_color * irradiance
}

/// Prefiltered environment radiance along reflection `r`. Roughness blends
/// toward the average environment color.
pub fn environment_color(r: Vec3, roughness: f32) -> Vec3 {
    let ry = r.y;
    let color = if ry > 0.3 {
        let t = (ry - 0.3) / 0.7;
        Vec3::new(0.8, 0.82, 0.85).lerp(Vec3::new(0.95, 0.93, 0.9), t * t)
    } else if ry > -0.1 {
        let glow = (-((ry - 0.1) * 5.0).powi(2)).exp();
        Vec3::new(0.55, 0.57, 0.6).lerp(Vec3::new(0.9, 0.88, 0.85), glow)
    } else {
        let t = (-ry - 0.1) / 0.9;
        Vec3::new(0.35, 0.33, 0.32).lerp(Vec3::new(0.1, 0.09, 0.08), t)
    };
    color.lerp(Vec3::new(0.5, 0.5, 0.52), roughness * roughness * 0.95)
}

/// ACES filmic curve fit, saturated to `[0, 1]`.
pub fn aces_film(x: Vec3) -> Vec3 {
    let (a, b, c, d, e) = (2.51, 0.03, 2.43, 0.59, 0.14);
    ((x * (a * x + b)) / (x * (c * x + d) + e)).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Lighting settings that scale the studio rig.
#[derive(Debug, Clone, Copy)]
pub struct LightingParams {
    pub exposure: f32,
    pub ibl_intensity: f32,
    pub direct_intensity: f32,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            ibl_intensity: 1.0,
            direct_intensity: 1.0,
        }
    }
}

/// Full PBR color for one fragment. `brdf` is the lookup-table sample at
/// `(N·V, roughness)`; `n` and `v` are world-space unit vectors.
pub fn shade(surface: &SurfaceInputs, n: Vec3, v: Vec3, brdf: Vec2, lighting: &LightingParams) -> Vec4 {
    let base = surface.base_color.truncate();
    let metallic = surface.metallic;
    let roughness = surface.roughness;
    let alpha = roughness * roughness;
    let n_dot_v = n.dot(v).max(0.001);
    let r = reflect(-v, n);

    let mut direct = Vec3::ZERO;
    for light in &STUDIO_LIGHTS {
        let l = light.direction.normalize();
        let h = (v + l).normalize();
        let n_dot_l = n.dot(l).max(0.0);
        let n_dot_h = n.dot(h).max(0.0);
        let h_dot_v = h.dot(v).max(0.0);

        let f = fresnel_schlick(h_dot_v, surface.f0);
        let specular = distribution_ggx(n_dot_h, alpha) * geometry_smith(n_dot_v, n_dot_l, roughness) * f
            / (4.0 * n_dot_v * n_dot_l + 0.0001);
        let k_d = (Vec3::ONE - f) * (1.0 - metallic);
        let diffuse = k_d * base / PI;
        direct += (diffuse + specular) * light.color * lighting.direct_intensity * light.weight * n_dot_l;
    }

    let f_ibl = fresnel_schlick_roughness(n_dot_v, surface.f0, roughness);
    let k_d_ibl = (Vec3::ONE - f_ibl) * (1.0 - metallic);
    let diffuse_ibl = ibl_diffuse(n, base) * k_d_ibl * 1.2;
    let rough_dielectric = lerp(1.0, 0.15, roughness * roughness * (1.0 - metallic));
    let specular_ibl = environment_color(r, roughness) * (surface.f0 * brdf.x + brdf.y) * rough_dielectric;
    let ambient = (diffuse_ibl + specular_ibl) * lighting.ibl_intensity * surface.ao;

    let rim_fresnel = (1.0 - n_dot_v).powi(4) * (1.0 - roughness * 0.8);
    let luminance = base.dot(Vec3::new(0.299, 0.587, 0.114));
    let rim_boost = (1.0 - luminance).max(0.2);
    let rim = environment_color(r, roughness.max(0.5)) * rim_fresnel * rim_boost * 0.2;

    let color = (ambient + direct + rim) * lighting.exposure;
    gamma_encode(aces_film(color)).extend(surface.base_color.w)
}

fn reflect(incident: Vec3, n: Vec3) -> Vec3 {
    incident - 2.0 * n.dot(incident) * n
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn close(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < EPS
    }

    fn surface(metallic: f32, roughness: f32) -> SurfaceInputs {
        SurfaceInputs::resolve(&SurfaceSamples {
            base_color_texel: Vec4::new(0.5, 0.25, 1.0, 1.0),
            metallic_factor: metallic,
            roughness_factor: roughness,
            ..Default::default()
        })
    }

    #[test]
    fn metalness_channel_is_raw_clamped_metallic() {
        let s = SurfaceInputs::resolve(&SurfaceSamples {
            metallic_roughness_texel: Vec4::new(1.0, 1.0, 0.5, 1.0),
            metallic_factor: 0.6,
            ..Default::default()
        });
        let out = channel_output(RenderMode::Metalness, &s, Vec4::ZERO).unwrap();
        assert!(close(out, Vec4::new(0.3, 0.3, 0.3, 1.0)), "{out}");

        let over = SurfaceInputs::resolve(&SurfaceSamples {
            metallic_factor: 3.0,
            ..Default::default()
        });
        let out = channel_output(RenderMode::Metalness, &over, Vec4::ZERO).unwrap();
        assert!(close(out, Vec4::ONE), "clamped to 1, no gamma: {out}");
    }

    #[test]
    fn base_color_channel_is_gamma_encoded() {
        let s = surface(0.0, 0.8);
        let out = channel_output(RenderMode::BaseColor, &s, Vec4::ZERO).unwrap();
        let expected = Vec4::new(0.5f32.powf(1.0 / 2.2), 0.25f32.powf(1.0 / 2.2), 1.0, 1.0);
        assert!(close(out, expected), "{out} vs {expected}");
    }

    #[test]
    fn base_color_multiplies_texture_vertex_color_and_factor() {
        let s = SurfaceInputs::resolve(&SurfaceSamples {
            base_color_texel: Vec4::new(0.5, 1.0, 1.0, 1.0),
            vertex_color: Vec4::new(1.0, 0.5, 1.0, 1.0),
            base_color_factor: Vec4::new(1.0, 1.0, 0.5, 0.5),
            ..Default::default()
        });
        assert!(close(s.base_color, Vec4::new(0.5, 0.5, 0.5, 0.5)));
    }

    #[test]
    fn roughness_channel_respects_floor() {
        let s = surface(0.0, 0.0);
        let out = channel_output(RenderMode::Roughness, &s, Vec4::ZERO).unwrap();
        assert!(close(out, Vec4::new(MIN_ROUGHNESS, MIN_ROUGHNESS, MIN_ROUGHNESS, 1.0)));
    }

    #[test]
    fn f0_blends_from_dielectric_to_base_color() {
        let dielectric = surface(0.0, 0.5);
        assert!((dielectric.f0 - Vec3::splat(0.04)).abs().max_element() < EPS);

        let metal = surface(1.0, 0.5);
        assert!((metal.f0 - Vec3::new(0.5, 0.25, 1.0)).abs().max_element() < EPS);

        let black_metal = SurfaceInputs::resolve(&SurfaceSamples {
            base_color_texel: Vec4::new(0.0, 0.0, 0.0, 1.0),
            metallic_factor: 1.0,
            ..Default::default()
        });
        assert!((black_metal.f0 - Vec3::splat(MIN_METAL_F0)).abs().max_element() < EPS);

        let out = channel_output(RenderMode::SpecularF0, &dielectric, Vec4::ZERO).unwrap();
        let g = 0.04f32.powf(1.0 / 2.2);
        assert!(close(out, Vec4::new(g, g, g, 1.0)));
    }

    #[test]
    fn occlusion_channel_applies_strength() {
        let s = SurfaceInputs::resolve(&SurfaceSamples {
            occlusion_texel: Vec4::new(0.2, 0.0, 0.0, 1.0),
            occlusion_strength: 0.5,
            ..Default::default()
        });
        let out = channel_output(RenderMode::AmbientOcclusion, &s, Vec4::ZERO).unwrap();
        assert!(close(out, Vec4::new(0.6, 0.6, 0.6, 1.0)), "{out}");
    }

    #[test]
    fn matcap_channel_keeps_texel_alpha() {
        let s = surface(0.0, 0.8);
        let out = channel_output(RenderMode::Matcap, &s, Vec4::new(1.0, 1.0, 1.0, 0.5)).unwrap();
        assert!(close(out, Vec4::new(1.0, 1.0, 1.0, 0.5)));
    }

    #[test]
    fn every_channel_mode_short_circuits() {
        let s = surface(0.3, 0.6);
        for mode in RenderMode::ALL {
            assert_eq!(
                channel_output(mode, &s, Vec4::ONE).is_some(),
                mode.is_channel_view(),
                "{mode:?}"
            );
        }
    }

    #[test]
    fn matcap_uv_maps_view_normals_to_sphere() {
        assert_eq!(matcap_uv(Vec3::Z), Vec2::new(0.5, 0.5));
        assert_eq!(matcap_uv(Vec3::X), Vec2::new(1.0, 0.5));
        assert_eq!(matcap_uv(Vec3::Y), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn ggx_peaks_at_aligned_half_vector() {
        let alpha = 0.25;
        assert!(distribution_ggx(1.0, alpha) > distribution_ggx(0.8, alpha));
    }

    #[test]
    fn direct_and_ibl_geometry_use_different_k() {
        let r = 0.5;
        assert!(geometry_direct(0.5, r) < geometry_ibl(0.5, r));
    }

    #[test]
    fn fresnel_reaches_one_at_grazing() {
        let f = fresnel_schlick(0.0, Vec3::splat(0.04));
        assert!((f - Vec3::ONE).abs().max_element() < EPS);
        let rough = fresnel_schlick_roughness(0.0, Vec3::splat(0.04), 0.9);
        assert!((rough - Vec3::splat(0.1)).abs().max_element() < 1e-4);
    }

    #[test]
    fn environment_is_bright_above_and_dark_below() {
        let up = environment_color(Vec3::Y, 0.0);
        let down = environment_color(-Vec3::Y, 0.0);
        assert!(up.x > down.x * 5.0);
        // Fully rough surfaces see a nearly uniform environment.
        let blurred_up = environment_color(Vec3::Y, 1.0);
        let blurred_down = environment_color(-Vec3::Y, 1.0);
        assert!((blurred_up - blurred_down).abs().max_element() < 0.05);
    }

    #[test]
    fn aces_saturates() {
        assert_eq!(aces_film(Vec3::ZERO), Vec3::ZERO);
        assert!((aces_film(Vec3::splat(100.0)) - Vec3::ONE).abs().max_element() < 0.01);
    }

    #[test]
    fn shade_is_black_without_exposure_and_keeps_alpha() {
        let mut s = surface(0.2, 0.5);
        s.base_color.w = 0.4;
        let lighting = LightingParams {
            exposure: 0.0,
            ..Default::default()
        };
        let out = shade(&s, Vec3::Y, Vec3::Z, Vec2::new(0.5, 0.1), &lighting);
        assert!(close(out, Vec4::new(0.0, 0.0, 0.0, 0.4)), "{out}");
    }

    #[test]
    fn shade_brightens_with_ibl_intensity() {
        let s = surface(0.0, 0.6);
        let n = Vec3::new(0.0, 0.6, 0.8);
        let v = Vec3::Z;
        let dim = shade(&s, n, v, Vec2::new(0.6, 0.1), &LightingParams {
            ibl_intensity: 0.2,
            ..Default::default()
        });
        let bright = shade(&s, n, v, Vec2::new(0.6, 0.1), &LightingParams {
            ibl_intensity: 2.0,
            ..Default::default()
        });
        assert!(bright.truncate().length() > dim.truncate().length());
        assert!(bright.max_element() <= 1.0);
    }
}
