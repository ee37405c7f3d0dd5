//! Persisted view state: what part of the drawing is on screen.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// View center, zoom and rotation. Renderers derive their screen transform
/// from this; the core itself only works in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    /// World point shown at the middle of the viewport.
    pub center: Point,
    /// Screen pixels per world unit.
    pub zoom: f64,
    /// View rotation in radians.
    pub rotation: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center: Point::ZERO,
            zoom: 1.0,
            rotation: 0.0,
            min_zoom: 0.01,
            max_zoom: 100.0,
        }
    }
}

impl ViewState {
    /// World to screen transform for a viewport of the given size.
    pub fn transform(&self, viewport: Size) -> Affine {
        Affine::translate(Vec2::new(viewport.width / 2.0, viewport.height / 2.0))
            * Affine::rotate(self.rotation)
            * Affine::scale(self.zoom)
            * Affine::translate(-self.center.to_vec2())
    }

    /// Screen to world transform for a viewport of the given size.
    pub fn inverse_transform(&self, viewport: Size) -> Affine {
        self.transform(viewport).inverse()
    }

    /// Pan by a delta in world units.
    pub fn pan(&mut self, delta: Vec2) {
        self.center += delta;
    }

    /// Multiply the zoom, clamped to the allowed range.
    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
    }

    /// Zoom while keeping `world_point` fixed on screen.
    pub fn zoom_at(&mut self, world_point: Point, factor: f64) {
        let old = self.zoom;
        self.zoom_by(factor);
        if (self.zoom - old).abs() < f64::EPSILON {
            return;
        }
        let ratio = old / self.zoom;
        self.center = world_point + (self.center - world_point) * ratio;
    }

    /// Show `bounds` inside a viewport, leaving `padding` screen pixels around it.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        self.center = bounds.center();
        if bounds.width() <= f64::EPSILON && bounds.height() <= f64::EPSILON {
            return;
        }
        let avail_w = (viewport.width - padding * 2.0).max(1.0);
        let avail_h = (viewport.height - padding * 2.0).max(1.0);
        let scale_x = avail_w / bounds.width().max(f64::EPSILON);
        let scale_y = avail_h / bounds.height().max(f64::EPSILON);
        self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);
    }

    pub fn reset(&mut self) {
        *self = Self {
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            ..Self::default()
        };
    }
}
