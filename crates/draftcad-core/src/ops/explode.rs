//! Break compound objects into their parts.

use crate::array::expand_array;
use crate::document::{CadDocument, Changeset};
use crate::geometry::generate_polygon_points;
use crate::shapes::{CadObject, ObjectId, ShapeData, rectangle_corners};
use kurbo::Point;

fn ring_segments(points: &[Point], closed: bool) -> Vec<(Point, Point)> {
    let mut segments: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
    if closed && points.len() > 2 {
        segments.push((points[points.len() - 1], points[0]));
    }
    segments
        .into_iter()
        .filter(|(a, b)| a.distance(*b) > f64::EPSILON)
        .collect()
}

/// Parts an object explodes into, or `None` if it is not compound.
///
/// Rectangles, polygons and polylines become lines. Block references become
/// world-space copies of the block's children, and associative arrays
/// become their instances.
pub fn explode_object(doc: &CadDocument, object: &CadObject) -> Option<Vec<CadObject>> {
    let segments = match &object.data {
        ShapeData::Rectangle { corner1, corner2 } => ring_segments(&rectangle_corners(*corner1, *corner2), true),
        ShapeData::Polygon { center, radius, sides, rotation } => {
            ring_segments(&generate_polygon_points(*center, *radius, *sides, *rotation), true)
        }
        ShapeData::Polyline { points, closed } => ring_segments(points, *closed),
        ShapeData::BlockRef { .. } => return Some(doc.resolve_block_ref(object)),
        ShapeData::ArrayRef { .. } => return Some(expand_array(object)),
        _ => return None,
    };
    Some(
        segments
            .into_iter()
            .map(|(start, end)| object.derive(ShapeData::Line { start, end }))
            .collect(),
    )
}

/// Replace each compound object among `ids` with its parts.
pub fn explode(doc: &CadDocument, ids: &[ObjectId]) -> Option<Changeset> {
    let mut changes = Changeset::default();
    for object in ids.iter().filter_map(|id| doc.get_object(*id)) {
        if !doc.is_editable(object) {
            continue;
        }
        if let Some(parts) = explode_object(doc, object) {
            changes.remove(object.id);
            for mut part in parts {
                part.selected = false;
                changes.add(part);
            }
        }
    }
    (!changes.is_empty()).then_some(changes)
}
