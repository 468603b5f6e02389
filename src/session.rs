//! Pointer-driven drag sessions.
//!
//! [`DragController`] is the only owner of the globe's [`Orientation`].
//! Everything else reads it through [`DragController::orientation`] or a
//! borrowed [`Projection`], so there is exactly one writer.

use glam::DVec2;

use crate::drag::compute_new_orientation;
use crate::error::EngineError;
use crate::geo::GeoPoint;
use crate::orientation::Orientation;
use crate::projection::{Projection, ProjectionParameters};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DragState {
    Idle,
    /// `origin` is the surface point grabbed at pointer-down. It stays
    /// fixed for the whole gesture.
    Dragging { origin: GeoPoint },
}

/// What a pointer-move did to the globe.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DragOutcome {
    /// The orientation changed; the host should redraw.
    Rotated(Orientation),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct DragController {
    orientation: Orientation,
    state: DragState,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(Orientation::ZERO)
    }
}

impl DragController {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            state: DragState::Idle,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn projection<'a>(&'a self, params: &'a ProjectionParameters) -> Projection<'a> {
        Projection::new(&self.orientation, params)
    }

    /// Starts a gesture at `screen`. A press during an active drag starts
    /// over with a new origin.
    pub fn pointer_down(
        &mut self,
        screen: DVec2,
        params: &ProjectionParameters,
    ) -> Result<GeoPoint, EngineError> {
        let origin = self.locate(screen, params)?;
        if self.is_dragging() {
            log::debug!("pointer down during drag, restarting session");
        }
        self.state = DragState::Dragging { origin };
        log::debug!("drag start at ({:.4}, {:.4})", origin.lon, origin.lat);
        Ok(origin)
    }

    pub fn pointer_move(
        &mut self,
        screen: DVec2,
        params: &ProjectionParameters,
    ) -> Result<DragOutcome, EngineError> {
        let current = self.locate(screen, params)?;
        let DragState::Dragging { origin } = self.state else {
            return Ok(DragOutcome::Ignored);
        };

        let next = compute_new_orientation(origin, current, self.orientation);
        if next == self.orientation {
            return Ok(DragOutcome::Ignored);
        }
        self.orientation = next;
        Ok(DragOutcome::Rotated(next))
    }

    pub fn pointer_up(&mut self) {
        if self.is_dragging() {
            log::debug!("drag end at {:?}", self.orientation);
        }
        self.state = DragState::Idle;
    }

    /// Abandons the gesture (pointer cancel, focus loss, capture loss).
    /// The orientation reached so far is kept.
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            log::debug!("drag cancelled at {:?}", self.orientation);
        }
        self.state = DragState::Idle;
    }

    /// Replaces the orientation, ending any gesture in progress.
    pub fn reset(&mut self, orientation: Orientation) {
        self.state = DragState::Idle;
        self.orientation = orientation;
    }

    fn locate(&self, screen: DVec2, params: &ProjectionParameters) -> Result<GeoPoint, EngineError> {
        if !screen.is_finite() {
            log::warn!("rejecting pointer at ({}, {})", screen.x, screen.y);
            return Err(EngineError::NonFinitePointer {
                x: screen.x,
                y: screen.y,
            });
        }
        self.projection(params).inverse(screen)
    }
}

#[cfg(test)]
mod tests {
    use super::{DragController, DragOutcome, DragState};
    use crate::error::EngineError;
    use crate::geo::GeoPoint;
    use crate::orientation::Orientation;
    use crate::projection::ProjectionParameters;
    use glam::DVec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn params() -> ProjectionParameters {
        ProjectionParameters::centered(800.0, 600.0, 250.0).unwrap()
    }

    #[test]
    fn starts_idle_at_zero() {
        let c = DragController::default();
        assert_eq!(c.state(), DragState::Idle);
        assert_eq!(c.orientation(), Orientation::ZERO);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut c = DragController::default();
        let out = c.pointer_move(DVec2::new(500.0, 300.0), &params()).unwrap();
        assert_eq!(out, DragOutcome::Ignored);
        assert_eq!(c.orientation(), Orientation::ZERO);
    }

    #[test]
    fn press_captures_origin_under_pointer() {
        let mut c = DragController::default();
        let origin = c.pointer_down(DVec2::new(400.0, 300.0), &params()).unwrap();
        assert_close(origin.lon, 0.0, 1e-12);
        assert_close(origin.lat, 0.0, 1e-12);
        assert!(c.is_dragging());
    }

    #[test]
    fn grabbed_point_follows_pointer() {
        let p = params();
        let mut c = DragController::new(Orientation::new(15.0, -10.0, 0.0));
        let origin = c.pointer_down(DVec2::new(430.0, 280.0), &p).unwrap();

        let path = [
            DVec2::new(450.0, 290.0),
            DVec2::new(480.0, 310.0),
            DVec2::new(520.0, 350.0),
            DVec2::new(560.0, 330.0),
        ];
        for screen in path {
            let out = c.pointer_move(screen, &p).unwrap();
            assert!(matches!(out, DragOutcome::Rotated(_)));
            let drawn = c.projection(&p).forward(origin);
            assert_close(drawn.x, screen.x, 1e-6);
            assert_close(drawn.y, screen.y, 1e-6);
        }
    }

    #[test]
    fn release_keeps_orientation() {
        let p = params();
        let mut c = DragController::default();
        c.pointer_down(DVec2::new(400.0, 300.0), &p).unwrap();
        c.pointer_move(DVec2::new(450.0, 300.0), &p).unwrap();
        let turned = c.orientation();
        c.pointer_up();
        assert_eq!(c.state(), DragState::Idle);
        assert_eq!(c.orientation(), turned);
        assert!(turned.yaw > 0.0);

        let out = c.pointer_move(DVec2::new(600.0, 300.0), &p).unwrap();
        assert_eq!(out, DragOutcome::Ignored);
        assert_eq!(c.orientation(), turned);
    }

    #[test]
    fn second_press_restarts_session() {
        let p = params();
        let mut c = DragController::default();
        c.pointer_down(DVec2::new(400.0, 300.0), &p).unwrap();
        c.pointer_move(DVec2::new(420.0, 300.0), &p).unwrap();
        let second = c.pointer_down(DVec2::new(400.0, 300.0), &p).unwrap();
        assert_eq!(c.state(), DragState::Dragging { origin: second });
        let expected = c.projection(&p).inverse(DVec2::new(400.0, 300.0)).unwrap();
        assert_close(second.lon, expected.lon, 1e-12);
        assert_close(second.lat, expected.lat, 1e-12);
    }

    #[test]
    fn non_finite_pointer_is_rejected_without_state_change() {
        let p = params();
        let mut c = DragController::default();
        let err = c.pointer_down(DVec2::new(f64::NAN, 0.0), &p).unwrap_err();
        assert!(matches!(err, EngineError::NonFinitePointer { .. }));
        assert_eq!(c.state(), DragState::Idle);

        c.pointer_down(DVec2::new(400.0, 300.0), &p).unwrap();
        let err = c.pointer_move(DVec2::new(0.0, f64::INFINITY), &p).unwrap_err();
        assert!(matches!(err, EngineError::NonFinitePointer { .. }));
        assert!(c.is_dragging());
        assert_eq!(c.orientation(), Orientation::ZERO);
    }

    #[test]
    fn cancel_and_reset() {
        let p = params();
        let mut c = DragController::default();
        c.pointer_down(DVec2::new(400.0, 300.0), &p).unwrap();
        c.pointer_move(DVec2::new(400.0, 200.0), &p).unwrap();
        let turned = c.orientation();
        c.cancel();
        assert!(!c.is_dragging());
        assert_eq!(c.orientation(), turned);

        c.pointer_down(DVec2::new(400.0, 300.0), &p).unwrap();
        c.reset(Orientation::ZERO);
        assert!(!c.is_dragging());
        assert_eq!(c.orientation(), Orientation::ZERO);
    }

    #[test]
    fn drag_off_the_disk_keeps_rotating() {
        let p = params();
        let mut c = DragController::default();
        c.pointer_down(DVec2::new(400.0, 300.0), &p).unwrap();
        let out = c.pointer_move(DVec2::new(2000.0, 300.0), &p).unwrap();
        let DragOutcome::Rotated(o) = out else {
            panic!("expected rotation, got {out:?}");
        };
        assert_close(o.yaw, 90.0, 1e-9);
        assert!(o.is_finite());
    }

    #[test]
    fn center_press_point_with_no_motion_is_ignored() {
        let p = params();
        let mut c = DragController::default();
        let origin = GeoPoint::new(0.0, 0.0);
        c.pointer_down(DVec2::new(400.0, 300.0), &p).unwrap();
        assert_eq!(c.state(), DragState::Dragging { origin });
        let out = c.pointer_move(DVec2::new(400.0, 300.0), &p).unwrap();
        assert_eq!(out, DragOutcome::Ignored);
    }
}
