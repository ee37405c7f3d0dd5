//! Corner fillet and chamfer math.

use super::{angle, normalize_angle, unit};
use kurbo::Point;
use std::f64::consts::PI;

/// Smallest corner angle (radians) that still counts as a corner.
const MIN_CORNER_ANGLE: f64 = 1e-6;

/// Geometry of a fillet arc tangent to two legs of a corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilletResult {
    /// Tangent point on the first leg.
    pub trim1: Point,
    /// Tangent point on the second leg.
    pub trim2: Point,
    pub center: Point,
    pub radius: f64,
    /// Arc start angle; the arc runs counter-clockwise to `end_angle`.
    pub start_angle: f64,
    pub end_angle: f64,
    /// Distance from the corner to each tangent point.
    pub tangent_distance: f64,
}

/// Trim points of a chamfer cut across a corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChamferResult {
    pub trim1: Point,
    pub trim2: Point,
}

/// Unit directions of both legs plus the opening angle between them.
fn corner_legs(p1: Point, corner: Point, p2: Point) -> Option<(kurbo::Vec2, kurbo::Vec2, f64)> {
    let u1 = unit(p1 - corner)?;
    let u2 = unit(p2 - corner)?;
    let theta = u1.dot(u2).clamp(-1.0, 1.0).acos();
    if theta < MIN_CORNER_ANGLE || PI - theta < MIN_CORNER_ANGLE {
        return None;
    }
    Some((u1, u2, theta))
}

/// Fit an arc of `radius` into the corner formed by `corner -> p1` and `corner -> p2`.
///
/// The arc center lies on the angle bisector. Returns `None` for collinear or
/// zero-length legs. The caller decides whether `tangent_distance` fits on both legs.
pub fn fillet_corner(p1: Point, corner: Point, p2: Point, radius: f64) -> Option<FilletResult> {
    let (u1, u2, theta) = corner_legs(p1, corner, p2)?;
    let radius = radius.max(0.0);
    let half = theta / 2.0;

    let tangent_distance = radius / half.tan();
    let trim1 = corner + u1 * tangent_distance;
    let trim2 = corner + u2 * tangent_distance;

    let bisector = unit(u1 + u2)?;
    let center = corner + bisector * (radius / half.sin());

    let a1 = angle(center, trim1);
    let a2 = angle(center, trim2);
    let (start_angle, end_angle) = if normalize_angle(a2 - a1) <= PI {
        (a1, a2)
    } else {
        (a2, a1)
    };

    Some(FilletResult {
        trim1,
        trim2,
        center,
        radius,
        start_angle,
        end_angle,
        tangent_distance,
    })
}

/// Cut a corner with a straight segment `distance1` along the first leg and
/// `distance2` along the second.
pub fn chamfer_corner(
    p1: Point,
    corner: Point,
    p2: Point,
    distance1: f64,
    distance2: f64,
) -> Option<ChamferResult> {
    let (u1, u2, _) = corner_legs(p1, corner, p2)?;
    Some(ChamferResult {
        trim1: corner + u1 * distance1.max(0.0),
        trim2: corner + u2 * distance2.max(0.0),
    })
}
