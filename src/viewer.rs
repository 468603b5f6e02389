// viewer.rs - globe state owned by the window: orientation engine, zoom and UI flags

use glam::DVec2;
use globe_viewer::{
    DragController, DragOutcome, EngineError, GeoPoint, Projection, ProjectionParameters, Settings,
};

pub struct GlobeViewer {
    pub controller: DragController,
    pub params: ProjectionParameters,
    pub settings: Settings,
    pub zoom: f64,
    pub show_markers: bool,
    pub is_fullscreen: bool,
    pub cursor: Option<DVec2>,
    base_scale: f64,
}

impl GlobeViewer {
    pub fn new(settings: Settings, width: f64, height: f64) -> Self {
        let mut viewer = Self {
            controller: DragController::new(settings.initial_orientation),
            params: ProjectionParameters {
                clip_angle: settings.clip_angle,
                ..ProjectionParameters::default()
            },
            show_markers: settings.show_markers,
            settings,
            zoom: 1.0,
            is_fullscreen: false,
            cursor: None,
            base_scale: 1.0,
        };
        viewer.resize(width, height);
        viewer
    }

    pub fn projection(&self) -> Projection<'_> {
        self.controller.projection(&self.params)
    }

    /// Recenters the globe and refits its radius to the new window size.
    pub fn resize(&mut self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.base_scale = 0.5 * width.min(height) * self.settings.globe_fraction;
        self.params.translate = DVec2::new(width * 0.5, height * 0.5);
        self.apply_zoom();
    }

    /// Wheel zoom; positive `notches` zoom in.
    pub fn zoom_by(&mut self, notches: f64) {
        let factor = self.settings.zoom_step.powf(notches);
        self.zoom = (self.zoom * factor).clamp(self.settings.min_zoom, self.settings.max_zoom);
        self.apply_zoom();
    }

    pub fn reset_view(&mut self) {
        self.controller.reset(self.settings.initial_orientation);
        self.zoom = 1.0;
        self.apply_zoom();
    }

    pub fn pointer_down(&mut self, screen: DVec2) -> Result<(), EngineError> {
        self.cursor = Some(screen);
        self.controller.pointer_down(screen, &self.params).map(|_| ())
    }

    pub fn pointer_move(&mut self, screen: DVec2) -> Result<DragOutcome, EngineError> {
        self.cursor = Some(screen);
        self.controller.pointer_move(screen, &self.params)
    }

    /// Geo point under the cursor, when the cursor is over the globe.
    pub fn hovered(&self) -> Option<GeoPoint> {
        let cursor = self.cursor?;
        let projection = self.projection();
        if !projection.contains(cursor) {
            return None;
        }
        projection.inverse(cursor).ok()
    }

    fn apply_zoom(&mut self) {
        self.params.scale = self.base_scale * self.zoom;
    }
}
