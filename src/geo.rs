use serde::{Deserialize, Serialize};

use crate::vector::Vector3;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    pub fn to_xyz(self) -> Vector3 {
        lonlat_to_xyz(self.lon, self.lat)
    }
}

/// Unit vector for a (longitude, latitude) pair in degrees.
///
/// `(0, 0)` maps to +X, `(90, 0)` to +Y and the north pole to +Z.
pub fn lonlat_to_xyz(lon: f64, lat: f64) -> Vector3 {
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

/// Inverse of [`lonlat_to_xyz`]. Accepts non-unit vectors; zero maps to `(0, 0)`.
pub fn xyz_to_lonlat(v: Vector3) -> GeoPoint {
    let len = v.length();
    if len == 0.0 {
        return GeoPoint::default();
    }
    let lat = (v.z / len).clamp(-1.0, 1.0).asin().to_degrees();
    let lon = v.y.atan2(v.x).to_degrees();
    GeoPoint::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::{lonlat_to_xyz, xyz_to_lonlat, GeoPoint};
    use crate::vector::Vector3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn prime_meridian_equator_is_x_axis() {
        let v = lonlat_to_xyz(0.0, 0.0);
        assert_close(v.x, 1.0, 1e-9);
        assert_close(v.y, 0.0, 1e-9);
        assert_close(v.z, 0.0, 1e-9);
    }

    #[test]
    fn north_pole_is_z_axis_for_any_longitude() {
        for lon in [0.0, 45.0, -120.0, 180.0] {
            let v = lonlat_to_xyz(lon, 90.0);
            assert_close(v.x, 0.0, 1e-9);
            assert_close(v.y, 0.0, 1e-9);
            assert_close(v.z, 1.0, 1e-9);
        }
    }

    #[test]
    fn ninety_east_is_y_axis() {
        let v = lonlat_to_xyz(90.0, 0.0);
        assert_close(v.x, 0.0, 1e-9);
        assert_close(v.y, 1.0, 1e-9);
    }

    #[test]
    fn xyz_round_trip() {
        let geo = GeoPoint::new(-73.9, 40.7);
        let back = xyz_to_lonlat(geo.to_xyz());
        assert_close(back.lon, geo.lon, 1e-9);
        assert_close(back.lat, geo.lat, 1e-9);
    }

    #[test]
    fn xyz_to_lonlat_ignores_length_and_zero() {
        let back = xyz_to_lonlat(Vector3::new(0.0, 0.0, 5.0));
        assert_close(back.lat, 90.0, 1e-9);
        assert_eq!(xyz_to_lonlat(Vector3::ZERO), GeoPoint::new(0.0, 0.0));
    }
}
