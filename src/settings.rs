//! Viewer settings.
//!
//! Settings live in a JSON file, located in this order:
//! 1) `--config <path>` on the command line
//! 2) `GLOBE_CONFIG` environment variable
//! 3) `<exe_dir>/assets/settings.json`
//! 4) `./assets/settings.json` (dev working dir)
//!
//! Missing fields take their defaults; a missing or broken file falls back
//! to [`Settings::default`] with a warning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SettingsError;
use crate::geo::GeoPoint;
use crate::orientation::Orientation;

/// A labelled point drawn on the globe while it faces the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

impl Marker {
    pub fn new(name: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            name: name.into(),
            lon,
            lat,
        }
    }

    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.lon, self.lat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub initial_orientation: Orientation,
    /// Globe radius as a fraction of half the smaller window side.
    pub globe_fraction: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom factor per wheel notch.
    pub zoom_step: f64,
    pub clip_angle: f64,
    pub show_markers: bool,
    pub markers: Vec<Marker>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_orientation: Orientation::ZERO,
            globe_fraction: 0.9,
            min_zoom: 0.25,
            max_zoom: 20.0,
            zoom_step: 1.1,
            clip_angle: 90.0,
            show_markers: true,
            markers: vec![
                Marker::new("London", -0.13, 51.51),
                Marker::new("New York", -74.01, 40.71),
                Marker::new("São Paulo", -46.63, -23.55),
                Marker::new("Cape Town", 18.42, -33.92),
                Marker::new("Cairo", 31.24, 30.04),
                Marker::new("Mumbai", 72.88, 19.08),
                Marker::new("Beijing", 116.41, 39.90),
                Marker::new("Tokyo", 139.69, 35.69),
                Marker::new("Sydney", 151.21, -33.87),
                Marker::new("Honolulu", -157.86, 21.31),
            ],
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.initial_orientation.is_finite() {
            return Err(SettingsError::Invalid(
                "initial_orientation must be finite".to_string(),
            ));
        }
        if !(self.globe_fraction > 0.0 && self.globe_fraction.is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "globe_fraction must be positive, got {}",
                self.globe_fraction
            )));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= 1.0 && self.max_zoom >= 1.0)
            || !self.max_zoom.is_finite()
        {
            return Err(SettingsError::Invalid(format!(
                "zoom range must satisfy 0 < min <= 1 <= max, got {}..{}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.zoom_step > 1.0 && self.zoom_step.is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "zoom_step must exceed 1, got {}",
                self.zoom_step
            )));
        }
        if !(self.clip_angle > 0.0 && self.clip_angle <= 180.0) {
            return Err(SettingsError::Invalid(format!(
                "clip_angle must be in (0, 180], got {}",
                self.clip_angle
            )));
        }
        if let Some(m) = self.markers.iter().find(|m| !m.geo().is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "marker {:?} has non-finite coordinates",
                m.name
            )));
        }
        Ok(())
    }

    /// Loads from `explicit` or the first settings file found; anything
    /// unreadable falls back to defaults.
    pub fn load_or_default(explicit: Option<PathBuf>) -> Self {
        let Some(path) = explicit.or_else(find_settings_file) else {
            log::info!("no settings file found, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(settings) => {
                log::info!("loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("ignoring settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Find assets/settings.json by searching:
/// 1) <exe_dir>/assets/settings.json
/// 2) ./assets/settings.json
fn find_settings_file() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("settings.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("settings.json");
    if p.exists() {
        return Some(p);
    }

    None
}

/// Settings path from CLI (`--config <path>`) or `GLOBE_CONFIG`.
pub fn resolve_config_from_args() -> Option<PathBuf> {
    let mut it = std::env::args();
    while let Some(a) = it.next() {
        if a == "--config" {
            if let Some(v) = it.next() {
                return Some(PathBuf::from(v));
            }
        }
    }

    if let Ok(v) = std::env::var("GLOBE_CONFIG") {
        if !v.trim().is_empty() {
            return Some(PathBuf::from(v));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{Marker, Settings};
    use crate::error::SettingsError;
    use crate::orientation::Orientation;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.initial_orientation, Orientation::ZERO);
        assert_eq!(s.clip_angle, 90.0);
        assert!(!s.markers.is_empty());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = Settings::from_json(
            r#"{
                "initial_orientation": { "yaw": -100.0, "pitch": -30.0, "roll": 0.0 },
                "markers": [ { "name": "Reykjavík", "lon": -21.94, "lat": 64.15 } ]
            }"#,
        )
        .unwrap();
        assert_eq!(s.initial_orientation, Orientation::new(-100.0, -30.0, 0.0));
        assert_eq!(s.markers, vec![Marker::new("Reykjavík", -21.94, 64.15)]);
        assert_eq!(s.zoom_step, Settings::default().zoom_step);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for text in [
            r#"{ "clip_angle": 0.0 }"#,
            r#"{ "clip_angle": 200.0 }"#,
            r#"{ "zoom_step": 1.0 }"#,
            r#"{ "min_zoom": 2.0 }"#,
            r#"{ "globe_fraction": -0.5 }"#,
        ] {
            let err = Settings::from_json(text).unwrap_err();
            assert!(matches!(err, SettingsError::Invalid(_)), "{text}: {err}");
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Settings::load(std::path::Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn unreadable_explicit_path_falls_back_to_defaults() {
        let s = Settings::load_or_default(Some("/nonexistent/settings.json".into()));
        assert_eq!(s, Settings::default());
    }
}
