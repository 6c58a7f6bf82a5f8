//! # Orbit Camera — Spherical Coordinates Around a Target
//!
//! The camera lives on a sphere around `target`, parameterised by azimuth,
//! elevation and distance. The world is Z-up; at azimuth 0 and elevation 0
//! the camera sits on the −Y axis looking toward +Y, so X points right and Z
//! points up on screen:
//!
//! ```text
//!   position = target + d · ( cos e · sin a,  −cos e · cos a,  sin e )
//! ```
//!
//! ## Two Independent Rotations
//!
//! Dragging moves the *camera* (azimuth/elevation). Auto-rotate spins the
//! *model* about one of its own axes. The two compose as
//! `projection · view · model`, so neither disturbs the other.
//!
//! ## Clamps
//!
//! - elevation stays strictly inside ±90°: at the pole the view direction is
//!   parallel to world-up and `look_at` has no defined basis
//! - azimuth wraps into `[0, 2π)`
//! - distance stays in `[min_distance, max_distance]`, which
//!   [`fit_to_mesh`](OrbitCamera::fit_to_mesh) scales to the loaded model
//!
//! ## Comparison
//!
//! - **three.js `OrbitControls`**: same spherical model, Y-up, with damping.
//! - **Blender viewport**: Z-up turntable orbit, the convention used here.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Vec3, look_at, perspective, rotation_xyz, wrap_angle};

/// Margin kept between the elevation and the poles.
const POLE_EPSILON: f32 = 0.001;
/// Fraction of the distance removed per unit of zoom input.
const ZOOM_STEP: f32 = 0.1;

/// Model axis that auto-rotation spins about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationAxis {
    X,
    Y,
    #[default]
    Z,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    /// Horizontal angle around Z in `[0, 2π)`. 0 is the −Y side.
    pub azimuth: f32,
    /// Angle above the XY plane, strictly inside `(−π/2, π/2)`.
    pub elevation: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub target: Vec3,

    pub auto_rotate: bool,
    /// Radians per second.
    pub rotation_speed: f32,
    pub rotation_axis: RotationAxis,
    /// Model rotation angles about X, Y and Z.
    pub model_rotation: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            fov_y: FRAC_PI_4,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            azimuth: 0.0,
            elevation: 0.0,
            distance: 5.0,
            min_distance: 0.5,
            max_distance: 100.0,
            target: Vec3::ZERO,
            auto_rotate: true,
            rotation_speed: 0.5,
            rotation_axis: RotationAxis::Z,
            model_rotation: Vec3::ZERO,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Frame a bounding sphere: the sphere fits the vertical FOV with a 1.5×
    /// margin, never closer than twice the radius. Zoom limits become
    /// `[0.5·r, 10·r]`.
    pub fn fit_to_mesh(&mut self, center: Vec3, radius: f32) {
        self.target = center;
        let fitted = radius * 1.5 / (self.fov_y / 2.0).tan();
        self.distance = fitted.max(radius * 2.0);
        self.min_distance = radius * 0.5;
        self.max_distance = radius * 10.0;
        log::debug!(
            "camera fit: radius {radius:.3}, distance {:.3}, zoom [{:.3}, {:.3}]",
            self.distance,
            self.min_distance,
            self.max_distance
        );
    }

    pub fn reset_model_rotation(&mut self) {
        self.model_rotation = Vec3::ZERO;
    }

    /// Advance auto-rotation by `dt` seconds about the selected axis.
    pub fn update(&mut self, dt: f32) {
        if !self.auto_rotate {
            return;
        }
        let delta = self.rotation_speed * dt;
        let angle = match self.rotation_axis {
            RotationAxis::X => &mut self.model_rotation.x,
            RotationAxis::Y => &mut self.model_rotation.y,
            RotationAxis::Z => &mut self.model_rotation.z,
        };
        *angle = (*angle + delta) % TAU;
    }

    /// Accumulate an orbit step. Positive `d_azimuth` moves the camera right
    /// (the model appears to turn left); positive `d_elevation` moves it up.
    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth = wrap_angle(self.azimuth + d_azimuth);
        let limit = FRAC_PI_2 - POLE_EPSILON;
        self.elevation = (self.elevation + d_elevation).clamp(-limit, limit);
    }

    /// Relative zoom: positive `delta` moves closer.
    pub fn zoom(&mut self, delta: f32) {
        self.distance *= 1.0 - delta * ZOOM_STEP;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn position(&self) -> Vec3 {
        let (sin_e, cos_e) = self.elevation.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + self.distance * Vec3::new(cos_e * sin_a, -cos_e * cos_a, sin_e)
    }

    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.position(), self.target, Vec3::Z)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        perspective(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Auto-rotation as `Rx · Ry · Rz`.
    pub fn model_matrix(&self) -> Mat4 {
        let r = self.model_rotation;
        rotation_xyz(r.x, r.y, r.z)
    }

    /// `projection · view · model`.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix() * self.model_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn default_position_is_on_negative_y() {
        let cam = OrbitCamera::new();
        assert!(approx(cam.position(), Vec3::new(0.0, -5.0, 0.0)));
    }

    #[test]
    fn elevation_never_reaches_the_pole() {
        let mut cam = OrbitCamera::new();
        for _ in 0..100 {
            cam.orbit(0.0, 10.0);
            assert!(cam.elevation < FRAC_PI_2);
        }
        for _ in 0..100 {
            cam.orbit(0.0, -10.0);
            assert!(cam.elevation > -FRAC_PI_2);
        }
        // The view matrix stays finite at the clamp.
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn azimuth_wraps() {
        let mut cam = OrbitCamera::new();
        cam.orbit(TAU + 0.1, 0.0);
        assert!((cam.azimuth - 0.1).abs() < 1e-5, "azimuth {}", cam.azimuth);
        cam.orbit(-0.2, 0.0);
        assert!((cam.azimuth - (TAU - 0.1)).abs() < 1e-5);
    }

    #[test]
    fn positive_azimuth_moves_camera_right() {
        let mut cam = OrbitCamera::new();
        cam.orbit(FRAC_PI_2, 0.0);
        assert!(approx(cam.position(), Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn zoom_is_relative_and_clamped() {
        let mut cam = OrbitCamera::new();
        cam.zoom(1.0);
        assert!((cam.distance - 4.5).abs() < 1e-5);

        cam.distance = cam.max_distance;
        cam.zoom(1.0);
        assert!(cam.distance < cam.max_distance);
        assert!(cam.distance >= cam.min_distance);

        cam.distance = cam.min_distance;
        cam.zoom(-1.0);
        assert!(cam.distance > cam.min_distance);
        assert!(cam.distance <= cam.max_distance);

        for _ in 0..200 {
            cam.zoom(1.0);
        }
        assert_eq!(cam.distance, cam.min_distance);
        for _ in 0..200 {
            cam.zoom(-1.0);
        }
        assert_eq!(cam.distance, cam.max_distance);
    }

    #[test]
    fn fit_frames_the_bounding_sphere() {
        let mut cam = OrbitCamera::new();
        cam.fit_to_mesh(Vec3::ZERO, 2.0);
        let expected = 3.0 / (FRAC_PI_4 / 2.0).tan();
        assert!((cam.distance - expected).abs() < 1e-4);
        assert_eq!(cam.min_distance, 1.0);
        assert_eq!(cam.max_distance, 20.0);
    }

    #[test]
    fn fit_floors_distance_at_twice_radius() {
        let mut cam = OrbitCamera::new();
        cam.fov_y = 3.0; // very wide: tan(1.5) ≈ 14
        cam.fit_to_mesh(Vec3::ZERO, 1.0);
        assert_eq!(cam.distance, 2.0);
    }

    #[test]
    fn update_advances_only_selected_axis() {
        let mut cam = OrbitCamera::new();
        cam.rotation_axis = RotationAxis::Y;
        cam.update(2.0);
        assert_eq!(cam.model_rotation, Vec3::new(0.0, 1.0, 0.0));

        cam.auto_rotate = false;
        cam.update(2.0);
        assert_eq!(cam.model_rotation.y, 1.0);
    }

    #[test]
    fn update_wraps_rotation() {
        let mut cam = OrbitCamera::new();
        cam.rotation_speed = 1.0;
        cam.update(TAU + 0.5);
        assert!((cam.model_rotation.z - 0.5).abs() < 1e-4);
    }

    #[test]
    fn model_rotation_applies_after_view() {
        let mut cam = OrbitCamera::new();
        cam.model_rotation.z = FRAC_PI_2;
        let combined = cam.view_projection_matrix();
        let manual = cam.projection_matrix() * cam.view_matrix() * Mat4::from_rotation_z(FRAC_PI_2);
        assert!(combined.abs_diff_eq(manual, 1e-5));
    }
}
