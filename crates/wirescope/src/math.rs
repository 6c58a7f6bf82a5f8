//! Math types, glam re-exports and the transform builders the viewer uses.
//!
//! Everything is column-major and right-multiplied, which is glam's own
//! convention: `a * b` applies `b` first. The world is Z-up; see
//! [`camera`](crate::camera) for how that shapes the orbit.

pub use glam::{Mat4, Vec2, Vec3, Vec4};

use std::f32::consts::TAU;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any point will grow. `extend` on it yields a
    /// zero-size box at that point.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Grow the box to include `point`.
    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Single-pass min/max reduction over a set of points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.extend(p);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the length of the box diagonal: the radius of a sphere centered on
    /// [`center`](Self::center) that encloses the whole box.
    pub fn bounding_radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }

    /// Return the box shifted by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Wrap an angle into `[0, 2π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Right-handed perspective projection with a `[0, 1]` depth range (wgpu).
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y, aspect, near, far)
}

/// Right-handed view matrix looking from `eye` toward `target`.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, target, up)
}

/// Euler rotation composed as `Rx · Ry · Rz` (Z is applied first).
pub fn rotation_xyz(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_rotation_x(x) * Mat4::from_rotation_y(y) * Mat4::from_rotation_z(z)
}

/// Transform a point (w = 1) and divide by the resulting w.
pub fn transform_point(m: &Mat4, p: Vec3) -> Vec3 {
    m.project_point3(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn aabb_from_points_reduces_min_max() {
        let aabb = Aabb::from_points([
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(-1.0, 4.0, 0.0),
            Vec3::new(0.5, 0.0, -6.0),
        ]);
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -6.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 4.0, 3.0));
        assert!(approx(aabb.center(), Vec3::new(0.0, 1.0, -1.5)));
    }

    #[test]
    fn empty_aabb_reports_empty() {
        assert!(Aabb::EMPTY.is_empty());
        assert!(!Aabb::from_points([Vec3::ZERO]).is_empty());
    }

    #[test]
    fn bounding_radius_is_half_diagonal() {
        let aabb = Aabb::from_points([Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)]);
        assert!((aabb.bounding_radius() - 0.5 * 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn wrap_angle_stays_in_range() {
        assert!((wrap_angle(TAU + 0.1) - 0.1).abs() < 1e-5);
        assert!((wrap_angle(-0.1) - (TAU - 0.1)).abs() < 1e-5);
        assert_eq!(wrap_angle(0.0), 0.0);
        assert!(wrap_angle(-1e-9) < TAU);
    }

    #[test]
    fn composition_applies_right_operand_first() {
        let translate = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let rotate = Mat4::from_rotation_z(FRAC_PI_2);
        // Rotate (1,0,0) to (0,1,0), then translate to (1,1,0).
        let p = transform_point(&(translate * rotate), Vec3::X);
        assert!(approx(p, Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn rotation_xyz_applies_z_first() {
        let m = rotation_xyz(FRAC_PI_2, 0.0, FRAC_PI_2);
        // Z turns X into Y, then X turns Y into Z.
        let p = transform_point(&m, Vec3::X);
        assert!(approx(p, Vec3::Z));
    }

    #[test]
    fn look_at_puts_target_on_negative_view_z() {
        let view = look_at(Vec3::new(0.0, -5.0, 0.0), Vec3::ZERO, Vec3::Z);
        let p = transform_point(&view, Vec3::ZERO);
        assert!(approx(p, Vec3::new(0.0, 0.0, -5.0)));
        // World +Z is screen up.
        let up = transform_point(&view, Vec3::Z);
        assert!(up.y > 0.0);
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let proj = perspective(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 1000.0);
        let near = transform_point(&proj, Vec3::new(0.0, 0.0, -0.1));
        let far = transform_point(&proj, Vec3::new(0.0, 0.0, -1000.0));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }
}
