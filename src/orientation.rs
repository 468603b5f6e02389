//! Euler-angle orientation of the globe.
//!
//! Convention: the rotation maps geographic unit vectors into the view
//! frame (X toward the viewer, Y screen-right, Z screen-up) as
//! `R = Rx(roll) · Ry(pitch) · Rz(yaw)`. Yaw spins the globe about its
//! polar axis, pitch tilts it about the screen-horizontal axis, roll turns
//! it about the line of sight. Positive yaw brings western longitudes to
//! the center; positive pitch brings northern latitudes to the center.

use serde::{Deserialize, Serialize};

use crate::quaternion::Quaternion;

/// `|cos(pitch)|` below which yaw and roll can no longer be separated.
const GIMBAL_EPSILON: f64 = 1e-9;

/// Yaw, pitch, roll in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Orientation {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn is_finite(self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite() && self.roll.is_finite()
    }

    pub fn to_quaternion(self) -> Quaternion {
        euler_to_quaternion(self)
    }

    pub fn from_quaternion(q: Quaternion) -> Self {
        quaternion_to_euler(q)
    }
}

pub fn euler_to_quaternion(euler: Orientation) -> Quaternion {
    let (sy, cy) = (euler.yaw.to_radians() * 0.5).sin_cos();
    let (sp, cp) = (euler.pitch.to_radians() * 0.5).sin_cos();
    let (sr, cr) = (euler.roll.to_radians() * 0.5).sin_cos();

    // qx(roll) * qy(pitch) * qz(yaw), expanded.
    Quaternion::new(
        cr * cp * cy - sr * sp * sy,
        sr * cp * cy + cr * sp * sy,
        cr * sp * cy - sr * cp * sy,
        cr * cp * sy + sr * sp * cy,
    )
}

/// Euler angles of a unit quaternion. Yaw and roll come back in
/// `(-180, 180]`, pitch in `[-90, 90]`. At pitch `±90` roll is pinned to 0
/// and the whole residual spin is reported as yaw.
pub fn quaternion_to_euler(q: Quaternion) -> Orientation {
    let Quaternion { w, x, y, z } = q;

    let r00 = 1.0 - 2.0 * (y * y + z * z);
    let r01 = 2.0 * (x * y - w * z);
    let r02 = 2.0 * (x * z + w * y);
    let r12 = 2.0 * (y * z - w * x);
    let r22 = 1.0 - 2.0 * (x * x + y * y);

    let sin_pitch = r02.clamp(-1.0, 1.0);
    let cos_pitch = r00.hypot(r01);
    let pitch = sin_pitch.atan2(cos_pitch);

    if cos_pitch < GIMBAL_EPSILON {
        let r10 = 2.0 * (x * y + w * z);
        let r11 = 1.0 - 2.0 * (x * x + z * z);
        return Orientation::new(r10.atan2(r11).to_degrees(), pitch.to_degrees(), 0.0);
    }

    Orientation::new(
        (-r01).atan2(r00).to_degrees(),
        pitch.to_degrees(),
        (-r12).atan2(r22).to_degrees(),
    )
}

#[cfg(test)]
mod tests {
    use super::{euler_to_quaternion, quaternion_to_euler, Orientation};
    use crate::geo::lonlat_to_xyz;
    use crate::quaternion::Quaternion;
    use crate::vector::Vector3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn assert_same_rotation(a: Quaternion, b: Quaternion, eps: f64) {
        assert_close(a.dot(b).abs(), 1.0, eps);
    }

    #[test]
    fn zero_orientation_is_identity() {
        assert!(euler_to_quaternion(Orientation::ZERO).is_identity());
        assert_eq!(quaternion_to_euler(Quaternion::IDENTITY), Orientation::ZERO);
    }

    #[test]
    fn closed_form_matches_axis_composition() {
        let e = Orientation::new(40.0, -25.0, 70.0);
        let qx = Quaternion::from_axis_angle(Vector3::X, e.roll.to_radians());
        let qy = Quaternion::from_axis_angle(Vector3::Y, e.pitch.to_radians());
        let qz = Quaternion::from_axis_angle(Vector3::Z, e.yaw.to_radians());
        assert_same_rotation(euler_to_quaternion(e), qx * qy * qz, 1e-12);
    }

    #[test]
    fn yaw_spins_about_the_pole() {
        let q = euler_to_quaternion(Orientation::new(90.0, 0.0, 0.0));
        let v = q.rotate(Vector3::X);
        assert_close(v.y, 1.0, 1e-12);
        let pole = q.rotate(Vector3::Z);
        assert_close(pole.z, 1.0, 1e-12);
    }

    #[test]
    fn positive_pitch_centers_northern_latitude() {
        let q = euler_to_quaternion(Orientation::new(0.0, 30.0, 0.0));
        let v = q.rotate(lonlat_to_xyz(0.0, 30.0));
        assert_close(v.x, 1.0, 1e-12);
    }

    #[test]
    fn euler_round_trip_away_from_gimbal_lock() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let e = Orientation::new(
                rng.gen_range(-179.0..179.0),
                rng.gen_range(-85.0..85.0),
                rng.gen_range(-179.0..179.0),
            );
            let back = quaternion_to_euler(euler_to_quaternion(e));
            assert_close(back.yaw, e.yaw, 1e-9);
            assert_close(back.pitch, e.pitch, 1e-9);
            assert_close(back.roll, e.roll, 1e-9);
        }
    }

    #[test]
    fn quaternion_round_trip_up_to_sign() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut checked = 0;
        while checked < 500 {
            let q = Quaternion::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if q.norm() < 0.1 {
                continue;
            }
            let q = q.normalize();
            let e = quaternion_to_euler(q);
            if e.pitch.abs() > 85.0 {
                continue;
            }
            assert_same_rotation(euler_to_quaternion(e), q, 1e-12);
            checked += 1;
        }
    }

    #[test]
    fn gimbal_lock_pins_roll_and_keeps_rotation() {
        for pitch in [90.0, -90.0] {
            let e = Orientation::new(30.0, pitch, 20.0);
            let q = euler_to_quaternion(e);
            let back = quaternion_to_euler(q);
            assert!(back.is_finite());
            assert_close(back.pitch, pitch, 1e-6);
            assert_eq!(back.roll, 0.0);
            assert_same_rotation(euler_to_quaternion(back), q, 1e-12);
        }
    }

    #[test]
    fn gimbal_lock_folds_roll_into_yaw() {
        let back = quaternion_to_euler(euler_to_quaternion(Orientation::new(30.0, 90.0, 20.0)));
        assert_close(back.yaw, 50.0, 1e-6);
        let back = quaternion_to_euler(euler_to_quaternion(Orientation::new(30.0, -90.0, 20.0)));
        assert_close(back.yaw, 10.0, 1e-6);
    }
}
