//! Cursor-to-point resolution shared by every tool.

use crate::document::CadDocument;
use crate::input::Modifiers;
use crate::snap::{SnapResult, constrain_to_ortho, constrain_to_polar, snap_to_grid};
use kurbo::Point;

/// Step used by the angle modifier when polar tracking is off.
pub const DEFAULT_ANGLE_STEP: f64 = 45.0;

/// A cursor position after snapping and constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPoint {
    pub point: Point,
    /// The object snap that produced `point`, for drawing a snap marker.
    /// Cleared when a later constraint moved the point off the snap.
    pub snap: Option<SnapResult>,
}

/// Resolve a world-space cursor position against the document's drawing aids.
///
/// An object snap wins over the raw cursor; grid rounding applies only to an
/// unsnapped cursor. With an `anchor` (the previous point of the current
/// tool) exactly one of these then applies: the shift angle lock, ortho or
/// polar tracking.
pub fn resolve_point(doc: &CadDocument, cursor: Point, anchor: Option<Point>, modifiers: Modifiers) -> ResolvedPoint {
    let settings = &doc.snap;
    let snap = doc.find_snap(cursor, doc.view.zoom);
    let mut point = match &snap {
        Some(hit) => hit.point,
        None if settings.grid_snap => snap_to_grid(cursor, doc.grid.spacing),
        None => cursor,
    };

    if let Some(anchor) = anchor {
        let constrained = if modifiers.shift {
            let step = if settings.polar { settings.polar_angle } else { DEFAULT_ANGLE_STEP };
            constrain_to_polar(anchor, point, step)
        } else if settings.ortho {
            constrain_to_ortho(anchor, point)
        } else if settings.polar {
            constrain_to_polar(anchor, point, settings.polar_angle)
        } else {
            point
        };
        if constrained != point {
            point = constrained;
            return ResolvedPoint { point, snap: None };
        }
    }

    ResolvedPoint { point, snap }
}
