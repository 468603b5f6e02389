//! Drag-to-rotation composition.

use crate::geo::GeoPoint;
use crate::orientation::Orientation;
use crate::quaternion::Quaternion;

/// Orientation after dragging the surface point `origin` to where the
/// surface point `current` sits under `orientation`.
///
/// The drag rotation takes `origin` onto `current` in geographic space and
/// is applied before the existing orientation (`q_current * q_drag`), so
/// the grabbed point lands exactly where the cursor is. Each call is a
/// single composition; nothing is accumulated between calls.
pub fn compute_new_orientation(
    origin: GeoPoint,
    current: GeoPoint,
    orientation: Orientation,
) -> Orientation {
    let drag = Quaternion::from_vectors(origin.to_xyz(), current.to_xyz());
    if drag.is_identity() {
        return orientation;
    }

    let composed = (orientation.to_quaternion() * drag).normalize();
    let next = Orientation::from_quaternion(composed);
    log::trace!(
        "drag ({:.4}, {:.4}) -> ({:.4}, {:.4}): {:?} -> {:?}",
        origin.lon,
        origin.lat,
        current.lon,
        current.lat,
        orientation,
        next
    );
    next
}

#[cfg(test)]
mod tests {
    use super::compute_new_orientation;
    use crate::geo::GeoPoint;
    use crate::orientation::Orientation;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn assert_same_orientation(a: Orientation, b: Orientation, eps: f64) {
        let dot = a.to_quaternion().dot(b.to_quaternion()).abs();
        assert_close(dot, 1.0, eps);
    }

    #[test]
    fn drag_right_along_equator_yaws_positive() {
        let next = compute_new_orientation(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(10.0, 0.0),
            Orientation::ZERO,
        );
        assert_close(next.yaw, 10.0, 1e-9);
        assert_close(next.pitch, 0.0, 1e-9);
        assert_close(next.roll, 0.0, 1e-9);
    }

    #[test]
    fn drag_north_along_meridian_pitches_negative() {
        // Pulling the center point upward tilts the southern hemisphere into view.
        let next = compute_new_orientation(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 15.0),
            Orientation::ZERO,
        );
        assert_close(next.yaw, 0.0, 1e-9);
        assert_close(next.pitch, -15.0, 1e-9);
        assert_close(next.roll, 0.0, 1e-9);
    }

    #[test]
    fn zero_length_drag_is_a_no_op() {
        let o = Orientation::new(123.4, -56.7, 250.0);
        for p in [GeoPoint::new(0.0, 0.0), GeoPoint::new(-45.0, 30.0), GeoPoint::new(10.0, 90.0)] {
            assert_eq!(compute_new_orientation(p, p, o), o);
        }
    }

    #[test]
    fn dragging_back_restores_orientation() {
        let start = Orientation::new(35.0, -20.0, 5.0);
        let a = GeoPoint::new(-30.0, 10.0);
        let b = GeoPoint::new(25.0, -40.0);
        let there = compute_new_orientation(a, b, start);
        let back = compute_new_orientation(b, a, there);
        assert_close(back.yaw, start.yaw, 1e-9);
        assert_close(back.pitch, start.pitch, 1e-9);
        assert_close(back.roll, start.roll, 1e-9);
    }

    #[test]
    fn antipodal_drag_stays_finite() {
        let next = compute_new_orientation(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(180.0, 0.0),
            Orientation::new(10.0, 20.0, 30.0),
        );
        assert!(next.is_finite());
    }

    #[test]
    fn many_small_steps_match_one_large_step() {
        let start = Orientation::new(20.0, 10.0, -5.0);
        let total = 60.0;

        for steps in [12_u32, 120, 1200] {
            let delta = total / f64::from(steps);

            // Along the equator and along a meridian, both great circles.
            let paths: [fn(f64) -> GeoPoint; 2] =
                [|t| GeoPoint::new(t, 0.0), |t| GeoPoint::new(40.0, t)];
            for path in paths {
                let mut o = start;
                for i in 0..steps {
                    let from = path(f64::from(i) * delta);
                    let to = path(f64::from(i + 1) * delta);
                    o = compute_new_orientation(from, to, o);
                }
                let direct = compute_new_orientation(path(0.0), path(total), start);
                let tolerance = 1e-13 * f64::from(steps) + 1e-12;
                assert_same_orientation(o, direct, tolerance);
                assert_close(o.yaw, direct.yaw, 1e-7);
                assert_close(o.pitch, direct.pitch, 1e-7);
                assert_close(o.roll, direct.roll, 1e-7);
            }
        }
    }
}
