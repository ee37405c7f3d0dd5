//! Object snap, grid snap and cursor angle constraints.

use crate::geometry::{
    SEGMENT_TOLERANCE, angle_in_arc_range, arc_point, closest_point_on_segment, generate_polygon_points,
    is_point_on_segment, line_intersection, normalize_angle, rotate_vector,
};
use crate::shapes::{CadObject, ObjectId, ShapeData, rectangle_corners};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::{FRAC_PI_2, PI};

/// Object snap modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SnapMode {
    Endpoint,
    Midpoint,
    Center,
    Quadrant,
    Intersection,
    Perpendicular,
    Tangent,
    Nearest,
    Node,
    Extension,
    Insertion,
    Apparent,
    Parallel,
}

impl SnapMode {
    /// Ranking among candidates within the aperture; lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            SnapMode::Endpoint => 1,
            SnapMode::Intersection => 2,
            SnapMode::Midpoint => 3,
            SnapMode::Center => 4,
            SnapMode::Quadrant => 5,
            SnapMode::Perpendicular => 6,
            SnapMode::Tangent => 7,
            SnapMode::Node => 8,
            SnapMode::Nearest => 9,
            SnapMode::Extension | SnapMode::Insertion | SnapMode::Apparent | SnapMode::Parallel => 10,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SnapMode::Endpoint => "Endpoint",
            SnapMode::Midpoint => "Midpoint",
            SnapMode::Center => "Center",
            SnapMode::Quadrant => "Quadrant",
            SnapMode::Intersection => "Intersection",
            SnapMode::Perpendicular => "Perpendicular",
            SnapMode::Tangent => "Tangent",
            SnapMode::Nearest => "Nearest",
            SnapMode::Node => "Node",
            SnapMode::Extension => "Extension",
            SnapMode::Insertion => "Insertion",
            SnapMode::Apparent => "Apparent intersection",
            SnapMode::Parallel => "Parallel",
        }
    }
}

/// The winning snap candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    pub point: Point,
    pub mode: SnapMode,
    /// Object that produced the candidate. For intersections, the first of the pair.
    pub object_id: Option<ObjectId>,
    /// World distance from the cursor.
    pub distance: f64,
}

impl SnapResult {
    pub fn label(&self) -> &'static str {
        self.mode.label()
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    point: Point,
    mode: SnapMode,
    object_id: Option<ObjectId>,
}

/// Characteristic points of one object for the enabled modes, plus the
/// cursor-dependent nearest and perpendicular points.
fn object_candidates(object: &CadObject, cursor: Point, modes: &BTreeSet<SnapMode>, out: &mut Vec<Candidate>) {
    let mut push = |point: Point, mode: SnapMode| {
        if modes.contains(&mode) {
            out.push(Candidate { point, mode, object_id: Some(object.id) });
        }
    };

    match &object.data {
        ShapeData::Line { start, end } => {
            push(*start, SnapMode::Endpoint);
            push(*end, SnapMode::Endpoint);
            push(start.midpoint(*end), SnapMode::Midpoint);
            let (foot, t) = closest_point_on_segment(cursor, *start, *end);
            push(foot, SnapMode::Nearest);
            if t > 0.0 && t < 1.0 {
                push(foot, SnapMode::Perpendicular);
            }
        }
        ShapeData::Polyline { points, .. } => {
            for p in points {
                push(*p, SnapMode::Endpoint);
            }
            for (a, b) in object.data.edges() {
                push(a.midpoint(b), SnapMode::Midpoint);
                push(closest_point_on_segment(cursor, a, b).0, SnapMode::Nearest);
            }
        }
        ShapeData::Circle { center, radius } => {
            push(*center, SnapMode::Center);
            for q in [0.0, FRAC_PI_2, PI, 1.5 * PI] {
                push(arc_point(*center, *radius, q), SnapMode::Quadrant);
            }
            if let Some(p) = radial_projection(cursor, *center, *radius) {
                push(p, SnapMode::Nearest);
            }
        }
        ShapeData::Arc { center, radius, start_angle, end_angle } => {
            push(arc_point(*center, *radius, *start_angle), SnapMode::Endpoint);
            push(arc_point(*center, *radius, *end_angle), SnapMode::Endpoint);
            let sweep = normalize_angle(end_angle - start_angle);
            push(arc_point(*center, *radius, start_angle + sweep / 2.0), SnapMode::Midpoint);
            push(*center, SnapMode::Center);
            for q in [0.0, FRAC_PI_2, PI, 1.5 * PI] {
                if angle_in_arc_range(q, *start_angle, *end_angle) {
                    push(arc_point(*center, *radius, q), SnapMode::Quadrant);
                }
            }
            if let Some(p) = radial_projection(cursor, *center, *radius) {
                let a = (p.y - center.y).atan2(p.x - center.x);
                if angle_in_arc_range(a, *start_angle, *end_angle) {
                    push(p, SnapMode::Nearest);
                }
            }
        }
        ShapeData::Rectangle { corner1, corner2 } => {
            for c in rectangle_corners(*corner1, *corner2) {
                push(c, SnapMode::Endpoint);
            }
            for (a, b) in object.data.edges() {
                push(a.midpoint(b), SnapMode::Midpoint);
                push(closest_point_on_segment(cursor, a, b).0, SnapMode::Nearest);
            }
            push(corner1.midpoint(*corner2), SnapMode::Center);
        }
        ShapeData::Polygon { center, radius, sides, rotation } => {
            let verts = generate_polygon_points(*center, *radius, *sides, *rotation);
            for (i, v) in verts.iter().enumerate() {
                push(*v, SnapMode::Endpoint);
                push(v.midpoint(verts[(i + 1) % verts.len()]), SnapMode::Midpoint);
            }
            push(*center, SnapMode::Center);
        }
        ShapeData::Ellipse { center, major_radius, minor_radius, rotation } => {
            push(*center, SnapMode::Center);
            for axis in [
                Vec2::new(*major_radius, 0.0),
                Vec2::new(0.0, *minor_radius),
                Vec2::new(-major_radius, 0.0),
                Vec2::new(0.0, -minor_radius),
            ] {
                push(*center + rotate_vector(axis, *rotation), SnapMode::Quadrant);
            }
        }
        ShapeData::Spline { control_points, .. } => {
            let last = control_points.len().saturating_sub(1);
            for (i, p) in control_points.iter().enumerate() {
                let mode = if i == 0 || i == last { SnapMode::Endpoint } else { SnapMode::Node };
                push(*p, mode);
            }
        }
        ShapeData::XLine { point, direction } => {
            push(project_on_direction(cursor, *point, *direction, false), SnapMode::Nearest);
        }
        ShapeData::Ray { point, direction } => {
            push(*point, SnapMode::Endpoint);
            push(project_on_direction(cursor, *point, *direction, true), SnapMode::Nearest);
        }
        ShapeData::Text { position, .. } => push(*position, SnapMode::Insertion),
        ShapeData::BlockRef { insertion_point, .. } => push(*insertion_point, SnapMode::Insertion),
        ShapeData::Dimension { points, text_position, .. } => {
            for p in points {
                push(*p, SnapMode::Node);
            }
            push(*text_position, SnapMode::Node);
        }
        ShapeData::ArrayRef { .. } => {}
    }
}

fn radial_projection(cursor: Point, center: Point, radius: f64) -> Option<Point> {
    let v = cursor - center;
    let len = v.hypot();
    if len < f64::EPSILON {
        return None;
    }
    Some(center + v * (radius / len))
}

fn project_on_direction(cursor: Point, origin: Point, direction: Vec2, semi_infinite: bool) -> Point {
    let len_sq = direction.hypot2();
    if len_sq < f64::EPSILON {
        return origin;
    }
    let mut t = (cursor - origin).dot(direction) / len_sq;
    if semi_infinite {
        t = t.max(0.0);
    }
    origin + direction * t
}

/// Nearest pairwise crossing of line-like edges across all objects.
fn nearest_intersection(cursor: Point, objects: &[&CadObject], tolerance: f64) -> Option<Candidate> {
    let edges: Vec<(ObjectId, Point, Point)> = objects
        .iter()
        .flat_map(|o| o.data.edges().into_iter().map(move |(a, b)| (o.id, a, b)))
        .collect();

    let mut best: Option<(f64, Candidate)> = None;
    for (i, &(id, a, b)) in edges.iter().enumerate() {
        for &(_, c, d) in &edges[i + 1..] {
            let Some(p) = line_intersection(a, b, c, d) else {
                continue;
            };
            if !is_point_on_segment(p, a, b, SEGMENT_TOLERANCE) || !is_point_on_segment(p, c, d, SEGMENT_TOLERANCE) {
                continue;
            }
            let dist = p.distance(cursor);
            if dist <= tolerance && best.is_none_or(|(bd, _)| dist < bd) {
                best = Some((
                    dist,
                    Candidate { point: p, mode: SnapMode::Intersection, object_id: Some(id) },
                ));
            }
        }
    }
    best.map(|(_, c)| c)
}

/// Find the best object snap near `cursor`.
///
/// `tolerance_px` is divided by `zoom` so the aperture stays constant on
/// screen. Hidden and locked objects are skipped. Candidates inside the
/// aperture are ranked by [`SnapMode::priority`], then by distance.
pub fn find_snap_point<'a>(
    cursor: Point,
    objects: impl IntoIterator<Item = &'a CadObject>,
    modes: &BTreeSet<SnapMode>,
    tolerance_px: f64,
    zoom: f64,
) -> Option<SnapResult> {
    if modes.is_empty() {
        return None;
    }
    let tolerance = tolerance_px / zoom.max(f64::EPSILON);
    let objects: Vec<&CadObject> = objects.into_iter().filter(|o| o.is_interactive()).collect();

    let mut candidates = Vec::new();
    for object in &objects {
        object_candidates(object, cursor, modes, &mut candidates);
    }
    if modes.contains(&SnapMode::Intersection) {
        candidates.extend(nearest_intersection(cursor, &objects, tolerance));
    }

    let best = candidates
        .into_iter()
        .map(|c| (c.point.distance(cursor), c))
        .filter(|(d, _)| *d <= tolerance)
        .min_by(|(da, a), (db, b)| {
            a.mode
                .priority()
                .cmp(&b.mode.priority())
                .then(da.total_cmp(db))
        })?;

    log::trace!("Snapped to {} at {:?}", best.1.mode.label(), best.1.point);
    Some(SnapResult {
        point: best.1.point,
        mode: best.1.mode,
        object_id: best.1.object_id,
        distance: best.0,
    })
}

/// Round a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, spacing: f64) -> Point {
    if spacing <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / spacing).round() * spacing,
        (point.y / spacing).round() * spacing,
    )
}

/// Lock `current` to the horizontal or vertical through `start`, whichever
/// axis has the larger delta.
pub fn constrain_to_ortho(start: Point, current: Point) -> Point {
    let d = current - start;
    if d.x.abs() >= d.y.abs() {
        Point::new(current.x, start.y)
    } else {
        Point::new(start.x, current.y)
    }
}

/// Snap the ray `start -> current` to the nearest multiple of `step_deg`,
/// keeping its length.
pub fn constrain_to_polar(start: Point, current: Point, step_deg: f64) -> Point {
    let d = current - start;
    let length = d.hypot();
    if length < f64::EPSILON || step_deg <= 0.0 {
        return current;
    }
    let angle = snap_angle(d.y.atan2(d.x).to_degrees(), step_deg).to_radians();
    Point::new(start.x + length * angle.cos(), start.y + length * angle.sin())
}

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    let snapped = (angle_degrees / increment).round() * increment;
    snapped.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn all_modes() -> BTreeSet<SnapMode> {
        [
            SnapMode::Endpoint,
            SnapMode::Midpoint,
            SnapMode::Center,
            SnapMode::Quadrant,
            SnapMode::Intersection,
            SnapMode::Perpendicular,
            SnapMode::Nearest,
            SnapMode::Node,
            SnapMode::Insertion,
        ]
        .into_iter()
        .collect()
    }

    fn object(data: ShapeData) -> CadObject {
        CadObject::new(Uuid::new_v4(), data)
    }

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> CadObject {
        object(ShapeData::Line { start: Point::new(x0, y0), end: Point::new(x1, y1) })
    }

    #[test]
    fn test_endpoint_beats_nearer_nearest() {
        let objs = [line(0.0, 0.0, 100.0, 0.0)];
        let snap = find_snap_point(Point::new(3.0, 0.5), &objs, &all_modes(), 10.0, 1.0).unwrap();
        assert_eq!(snap.mode, SnapMode::Endpoint);
        assert_eq!(snap.point, Point::ZERO);
    }

    #[test]
    fn test_same_priority_prefers_closer_candidate() {
        let left = line(0.0, 0.0, 10.0, 0.0);
        let right = line(14.0, 0.0, 30.0, 5.0);
        let objs = [left.clone(), right.clone()];
        let modes: BTreeSet<SnapMode> = [SnapMode::Endpoint].into_iter().collect();

        let snap = find_snap_point(Point::new(11.0, 0.5), &objs, &modes, 10.0, 1.0).unwrap();
        assert_eq!(snap.point, Point::new(10.0, 0.0));
        assert_eq!(snap.object_id, Some(left.id));

        let snap = find_snap_point(Point::new(13.0, 0.5), &objs, &modes, 10.0, 1.0).unwrap();
        assert_eq!(snap.point, Point::new(14.0, 0.0));
        assert_eq!(snap.object_id, Some(right.id));
    }

    #[test]
    fn test_midpoint() {
        let objs = [line(0.0, 0.0, 100.0, 0.0)];
        let snap = find_snap_point(Point::new(52.0, 1.0), &objs, &all_modes(), 10.0, 1.0).unwrap();
        assert_eq!(snap.mode, SnapMode::Midpoint);
        assert_eq!(snap.point, Point::new(50.0, 0.0));
        assert_eq!(snap.label(), "Midpoint");
    }

    #[test]
    fn test_tolerance_scales_with_zoom() {
        let objs = [line(0.0, 0.0, 100.0, 0.0)];
        let cursor = Point::new(50.0, 8.0);
        assert!(find_snap_point(cursor, &objs, &all_modes(), 10.0, 1.0).is_some());
        assert!(find_snap_point(cursor, &objs, &all_modes(), 10.0, 4.0).is_none());
    }

    #[test]
    fn test_result_within_tolerance() {
        let objs = [
            line(0.0, 0.0, 100.0, 0.0),
            object(ShapeData::Circle { center: Point::new(40.0, 40.0), radius: 15.0 }),
            object(ShapeData::Rectangle { corner1: Point::new(60.0, 10.0), corner2: Point::new(90.0, 30.0) }),
        ];
        for (x, y) in [(10.0, 3.0), (40.0, 26.0), (75.0, 11.0), (88.0, 29.0), (55.0, 40.0)] {
            let cursor = Point::new(x, y);
            if let Some(snap) = find_snap_point(cursor, &objs, &all_modes(), 6.0, 2.0) {
                assert!(snap.point.distance(cursor) <= 3.0 + 1e-12);
            }
        }
    }

    #[test]
    fn test_intersection_of_crossing_lines() {
        let objs = [line(0.0, 0.0, 100.0, 100.0), line(0.0, 100.0, 100.0, 0.0)];
        let snap = find_snap_point(Point::new(52.0, 49.0), &objs, &all_modes(), 10.0, 1.0).unwrap();
        assert_eq!(snap.mode, SnapMode::Intersection);
        assert!(snap.point.distance(Point::new(50.0, 50.0)) < 1e-9);
    }

    #[test]
    fn test_circle_quadrant_and_center() {
        let objs = [object(ShapeData::Circle { center: Point::ZERO, radius: 20.0 })];
        let q = find_snap_point(Point::new(0.0, 21.0), &objs, &all_modes(), 5.0, 1.0).unwrap();
        assert_eq!(q.mode, SnapMode::Quadrant);
        assert!(q.point.distance(Point::new(0.0, 20.0)) < 1e-9);
        let c = find_snap_point(Point::new(1.0, 1.0), &objs, &all_modes(), 5.0, 1.0).unwrap();
        assert_eq!(c.mode, SnapMode::Center);
    }

    #[test]
    fn test_locked_objects_are_ignored() {
        let mut l = line(0.0, 0.0, 10.0, 0.0);
        l.locked = true;
        assert!(find_snap_point(Point::ZERO, &[l], &all_modes(), 10.0, 1.0).is_none());
    }

    #[test]
    fn test_disabled_modes_produce_nothing() {
        let objs = [line(0.0, 0.0, 10.0, 0.0)];
        let only_center: BTreeSet<SnapMode> = [SnapMode::Center].into_iter().collect();
        assert!(find_snap_point(Point::ZERO, &objs, &only_center, 10.0, 1.0).is_none());
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Point::new(14.0, -6.0), 10.0), Point::new(10.0, -10.0));
        assert_eq!(snap_to_grid(Point::new(3.3, 4.4), 0.0), Point::new(3.3, 4.4));
    }

    #[test]
    fn test_constrain_to_ortho() {
        let start = Point::new(1.0, 1.0);
        assert_eq!(constrain_to_ortho(start, Point::new(10.0, 3.0)), Point::new(10.0, 1.0));
        assert_eq!(constrain_to_ortho(start, Point::new(2.0, -8.0)), Point::new(1.0, -8.0));
    }

    #[test]
    fn test_constrain_to_polar_keeps_length() {
        let p = constrain_to_polar(Point::ZERO, Point::new(10.0, 9.0), 45.0);
        let len = (10.0f64 * 10.0 + 9.0 * 9.0).sqrt();
        assert!((p.to_vec2().hypot() - len).abs() < 1e-9);
        assert!((p.x - p.y).abs() < 1e-9);
    }

    #[test]
    fn test_snap_angle_wraps() {
        assert_eq!(snap_angle(-10.0, 15.0), 345.0);
        assert_eq!(snap_angle(358.0, 15.0), 0.0);
    }
}
