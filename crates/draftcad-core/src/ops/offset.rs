//! Parallel copies of shapes.

use crate::document::{CadDocument, Changeset};
use crate::geometry::{
    closest_point_on_segment, offset_arc, offset_circle, offset_line, offset_polyline, rotate_vector,
};
use crate::shapes::{ObjectId, ShapeData};
use kurbo::{Point, Rect};
use std::f64::consts::PI;

/// Offset shape data by a signed distance.
///
/// Positive distances move lines and open polylines to the left of their
/// direction and grow closed shapes. Results that collapse to zero size are
/// `None`, as are shapes without an offset.
pub fn offset_shape(data: &ShapeData, distance: f64) -> Option<ShapeData> {
    match data {
        ShapeData::Line { start, end } => {
            let (start, end) = offset_line(*start, *end, distance)?;
            Some(ShapeData::Line { start, end })
        }
        ShapeData::Circle { center, radius } => {
            let radius = offset_circle(*radius, distance);
            (radius > 0.0).then_some(ShapeData::Circle { center: *center, radius })
        }
        ShapeData::Arc { center, radius, start_angle, end_angle } => {
            let radius = offset_arc(*radius, distance);
            (radius > 0.0).then_some(ShapeData::Arc {
                center: *center,
                radius,
                start_angle: *start_angle,
                end_angle: *end_angle,
            })
        }
        ShapeData::Polyline { points, closed } => (points.len() >= 2).then(|| ShapeData::Polyline {
            points: offset_polyline(points, distance, *closed),
            closed: *closed,
        }),
        ShapeData::Rectangle { corner1, corner2 } => {
            let rect = Rect::from_points(*corner1, *corner2).inflate(distance, distance);
            (rect.width() > 0.0 && rect.height() > 0.0).then_some(ShapeData::Rectangle {
                corner1: Point::new(rect.x0, rect.y0),
                corner2: Point::new(rect.x1, rect.y1),
            })
        }
        ShapeData::Polygon { center, radius, sides, rotation } => {
            if *sides < 3 {
                return None;
            }
            // Edges move by `distance`; vertices by distance / cos(π / n).
            let radius = radius + distance / (PI / *sides as f64).cos();
            (radius > 0.0).then_some(ShapeData::Polygon {
                center: *center,
                radius,
                sides: *sides,
                rotation: *rotation,
            })
        }
        ShapeData::Ellipse { center, major_radius, minor_radius, rotation } => {
            let (major, minor) = (major_radius + distance, minor_radius + distance);
            (minor > 0.0 && major > 0.0).then_some(ShapeData::Ellipse {
                center: *center,
                major_radius: major,
                minor_radius: minor,
                rotation: *rotation,
            })
        }
        _ => None,
    }
}

/// Which side of a shape `point` is on: `1.0` for the side positive offsets
/// move towards, `-1.0` otherwise.
fn side_of(data: &ShapeData, point: Point) -> f64 {
    let outward = |inside: bool| if inside { -1.0 } else { 1.0 };
    match data {
        ShapeData::Line { start, end } => left_of(*start, *end, point),
        ShapeData::Polyline { points, closed } => {
            let n = points.len();
            let count = if *closed { n } else { n.saturating_sub(1) };
            (0..count)
                .map(|i| (points[i], points[(i + 1) % n]))
                .min_by(|a, b| {
                    let da = closest_point_on_segment(point, a.0, a.1).0.distance(point);
                    let db = closest_point_on_segment(point, b.0, b.1).0.distance(point);
                    da.total_cmp(&db)
                })
                .map_or(1.0, |(a, b)| left_of(a, b, point))
        }
        ShapeData::Circle { center, radius } | ShapeData::Arc { center, radius, .. } => {
            outward(center.distance(point) < *radius)
        }
        ShapeData::Rectangle { corner1, corner2 } => outward(Rect::from_points(*corner1, *corner2).contains(point)),
        ShapeData::Polygon { center, radius, sides, .. } => {
            let apothem = radius * (PI / (*sides).max(3) as f64).cos();
            outward(center.distance(point) < apothem)
        }
        ShapeData::Ellipse { center, major_radius, minor_radius, rotation } => {
            let local = rotate_vector(point - *center, -rotation);
            let inside = (local.x / major_radius).powi(2) + (local.y / minor_radius).powi(2) < 1.0;
            outward(inside)
        }
        _ => 1.0,
    }
}

fn left_of(a: Point, b: Point, point: Point) -> f64 {
    if (b - a).cross(point - a) >= 0.0 { 1.0 } else { -1.0 }
}

/// Add an offset copy of an object. The original is left intact.
pub fn offset(doc: &CadDocument, id: ObjectId, distance: f64) -> Option<Changeset> {
    let object = doc.get_object(id).filter(|o| doc.is_editable(o))?;
    let data = offset_shape(&object.data, distance)?;
    let mut changes = Changeset::default();
    changes.add(object.derive(data));
    Some(changes)
}

/// Offset by `distance` towards the side of the object `through` lies on.
pub fn offset_through(doc: &CadDocument, id: ObjectId, distance: f64, through: Point) -> Option<Changeset> {
    let object = doc.get_object(id)?;
    let sign = side_of(&object.data, through);
    offset(doc, id, distance.abs() * sign)
}
