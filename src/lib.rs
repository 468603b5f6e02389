//! Drag-to-rotate orientation engine for an orthographic globe.
//!
//! Pointer drags become rotations of the sphere through unit quaternions;
//! the resulting [`Orientation`] drives forward/inverse projection and a
//! front-hemisphere visibility test.

pub mod drag;
pub mod error;
pub mod geo;
pub mod orientation;
pub mod projection;
pub mod quaternion;
pub mod session;
pub mod settings;
pub mod vector;

pub use drag::compute_new_orientation;
pub use error::{EngineError, SettingsError};
pub use geo::{lonlat_to_xyz, xyz_to_lonlat, GeoPoint};
pub use orientation::{euler_to_quaternion, quaternion_to_euler, Orientation};
pub use projection::{Projection, ProjectionParameters};
pub use quaternion::Quaternion;
pub use session::{DragController, DragOutcome, DragState};
pub use settings::{Marker, Settings};
pub use vector::Vector3;
