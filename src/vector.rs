//! 3-vector helpers on top of `glam::DVec3`.

use glam::DVec3;

pub type Vector3 = DVec3;

#[inline]
pub fn cross(v0: Vector3, v1: Vector3) -> Vector3 {
    v0.cross(v1)
}

#[inline]
pub fn dot(v0: Vector3, v1: Vector3) -> f64 {
    v0.dot(v1)
}

/// Unit vector in the direction of `v`, or zero when `v` has no length.
#[inline]
pub fn normalize(v: Vector3) -> Vector3 {
    v.normalize_or_zero()
}

/// Great-circle angle (radians) between two directions.
///
/// `atan2(|a×b|, a·b)` stays accurate near 0 and π where `acos` loses digits.
#[inline]
pub fn angular_distance(a: Vector3, b: Vector3) -> f64 {
    cross(a, b).length().atan2(dot(a, b))
}
