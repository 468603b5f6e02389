//! Rotation quaternions.
//!
//! Components are stored `(w, x, y, z)` with `w` the scalar part. A value
//! used as a rotation is kept at unit norm; [`Quaternion::normalize`] is
//! applied after every composition that feeds back into stored state.

use glam::DQuat;

use crate::vector::{cross, dot, normalize, Vector3};

/// Below this `|v0 × v1|` two unit vectors are treated as (anti)parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle_rad` about the unit vector `axis`.
    pub fn from_axis_angle(axis: Vector3, angle_rad: f64) -> Self {
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Minimal rotation taking unit vector `v0` onto unit vector `v1`.
    ///
    /// Parallel inputs give the identity. Antiparallel inputs have no
    /// preferred axis; the half-turn is taken about `v0 × Z` (or `v0 × X`
    /// when `v0` lies on the Z axis) so the result is deterministic.
    pub fn from_vectors(v0: Vector3, v1: Vector3) -> Self {
        let axis = cross(v0, v1);
        let cos_angle = dot(v0, v1).clamp(-1.0, 1.0);

        if axis.length() < PARALLEL_EPSILON {
            if cos_angle > 0.0 {
                return Self::IDENTITY;
            }
            let mut perpendicular = cross(v0, Vector3::Z);
            if perpendicular.length() < PARALLEL_EPSILON {
                perpendicular = cross(v0, Vector3::X);
            }
            return Self::from_axis_angle(normalize(perpendicular), std::f64::consts::PI);
        }

        Self::from_axis_angle(normalize(axis), cos_angle.acos()).normalize()
    }

    /// Hamilton product `self * other`: applying the result rotates by
    /// `other` first, then by `self`.
    pub fn multiply(self, other: Self) -> Self {
        let (a, b) = (self, other);
        Self::new(
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        )
    }

    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit-norm copy. A zero quaternion has no rotation to preserve and
    /// becomes the identity.
    pub fn normalize(self) -> Self {
        let n = self.norm();
        if n == 0.0 || !n.is_finite() {
            return Self::IDENTITY;
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    pub fn is_finite(self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Rotates `v` by this (unit) quaternion.
    pub fn rotate(self, v: Vector3) -> Vector3 {
        DQuat::from(self) * v
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        self.multiply(other)
    }
}

impl From<Quaternion> for DQuat {
    fn from(q: Quaternion) -> Self {
        DQuat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

impl From<DQuat> for Quaternion {
    fn from(q: DQuat) -> Self {
        Quaternion::new(q.w, q.x, q.y, q.z)
    }
}
