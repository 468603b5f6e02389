//! Orthographic projection of the rotated globe.
//!
//! The view frame has X pointing at the viewer, Y to the screen right and
//! Z up. Screen coordinates are pixels with y growing downward, so a view
//! vector `p` lands at `translate + scale * (p.y, -p.z)`.

use glam::DVec2;

use crate::error::EngineError;
use crate::geo::{xyz_to_lonlat, GeoPoint};
use crate::orientation::Orientation;
use crate::quaternion::Quaternion;
use crate::vector::{angular_distance, Vector3};

/// Scale, screen offset and clip angle. Owned by the zoom/pan side of the
/// host, independent of the orientation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectionParameters {
    /// Pixels per unit of sphere radius.
    pub scale: f64,
    /// Screen position of the sphere center.
    pub translate: DVec2,
    /// Angular radius of the visible cap, in degrees.
    pub clip_angle: f64,
}

impl Default for ProjectionParameters {
    fn default() -> Self {
        Self {
            scale: 249.5,
            translate: DVec2::new(480.0, 250.0),
            clip_angle: 90.0,
        }
    }
}

impl ProjectionParameters {
    pub fn new(scale: f64, translate: DVec2, clip_angle: f64) -> Result<Self, EngineError> {
        let params = Self {
            scale,
            translate,
            clip_angle,
        };
        params.validate()?;
        Ok(params)
    }

    /// Globe of radius `scale` centered in a `width` x `height` viewport.
    pub fn centered(width: f64, height: f64, scale: f64) -> Result<Self, EngineError> {
        Self::new(scale, DVec2::new(width * 0.5, height * 0.5), 90.0)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(EngineError::InvalidParameters(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if !self.translate.is_finite() {
            return Err(EngineError::InvalidParameters(format!(
                "translate must be finite, got {:?}",
                self.translate
            )));
        }
        if !(self.clip_angle > 0.0 && self.clip_angle <= 180.0) {
            return Err(EngineError::InvalidParameters(format!(
                "clip angle must be in (0, 180], got {}",
                self.clip_angle
            )));
        }
        Ok(())
    }
}

/// Read-only view of an orientation plus projection parameters.
#[derive(Debug, Copy, Clone)]
pub struct Projection<'a> {
    orientation: &'a Orientation,
    params: &'a ProjectionParameters,
    rotation: Quaternion,
}

impl<'a> Projection<'a> {
    pub fn new(orientation: &'a Orientation, params: &'a ProjectionParameters) -> Self {
        Self {
            orientation,
            params,
            rotation: orientation.to_quaternion(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        *self.orientation
    }

    pub fn params(&self) -> &ProjectionParameters {
        self.params
    }

    pub fn forward(&self, geo: GeoPoint) -> DVec2 {
        let p = self.rotation.rotate(geo.to_xyz());
        self.params.translate + self.params.scale * DVec2::new(p.y, -p.z)
    }

    /// Geo point under `screen`. Positions off the disk are pulled onto
    /// the limb, so a drag that leaves the globe keeps turning it.
    pub fn inverse(&self, screen: DVec2) -> Result<GeoPoint, EngineError> {
        if !screen.is_finite() {
            return Err(EngineError::NonFinitePointer {
                x: screen.x,
                y: screen.y,
            });
        }
        self.params.validate()?;

        let offset = (screen - self.params.translate) / self.params.scale;
        let (mut dy, mut dz) = (offset.x, -offset.y);
        let r2 = dy * dy + dz * dz;
        let dx = if r2 > 1.0 {
            let r = r2.sqrt();
            dy /= r;
            dz /= r;
            0.0
        } else {
            (1.0 - r2).sqrt()
        };

        let world = self.rotation.conjugate().rotate(Vector3::new(dx, dy, dz));
        Ok(xyz_to_lonlat(world))
    }

    /// True when `geo` lies strictly inside the visible cap.
    pub fn is_front_facing(&self, geo: GeoPoint) -> bool {
        angular_distance(geo.to_xyz(), self.center_vector()) < self.params.clip_angle.to_radians()
    }

    pub fn project_visible(&self, geo: GeoPoint) -> Option<DVec2> {
        self.is_front_facing(geo).then(|| self.forward(geo))
    }

    /// Geo point drawn at the center of the disk.
    pub fn center(&self) -> GeoPoint {
        xyz_to_lonlat(self.center_vector())
    }

    /// Whether `screen` falls on the drawn disk.
    pub fn contains(&self, screen: DVec2) -> bool {
        screen.is_finite()
            && (screen - self.params.translate).length() <= self.params.scale
    }

    fn center_vector(&self) -> Vector3 {
        self.rotation.conjugate().rotate(Vector3::X)
    }
}
