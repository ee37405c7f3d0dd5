//! Trim, extend and break for lines.

use super::editable_line;
use crate::document::{CadDocument, Changeset};
use crate::geometry::{
    SEGMENT_TOLERANCE, closest_point_on_segment, is_point_on_segment, line_intersection, point_to_segment_distance,
};
use crate::shapes::{ObjectId, ShapeData};
use kurbo::Point;

/// Pieces shorter than this are dropped by [`break_line`].
pub const MIN_SEGMENT_LENGTH: f64 = 0.1;

/// Edges of another object usable as a cutting edge or boundary.
fn boundary_edges(doc: &CadDocument, id: ObjectId) -> Vec<(Point, Point)> {
    doc.get_object(id).map(|o| o.data.edges()).unwrap_or_default()
}

fn replace_line(doc: &CadDocument, id: ObjectId, start: Point, end: Point) -> Option<Changeset> {
    let mut object = doc.get_object(id)?.clone();
    object.data = ShapeData::Line { start, end };
    let mut changes = Changeset::default();
    changes.update(object);
    Some(changes)
}

/// Cut a line where it crosses a cutting edge and keep the half nearer to
/// `pick`. The crossing must lie on the target line itself.
pub fn trim(doc: &CadDocument, target: ObjectId, cutting: ObjectId, pick: Point) -> Option<Changeset> {
    let (start, end) = editable_line(doc, target)?;
    let cut = boundary_edges(doc, cutting)
        .into_iter()
        .filter_map(|(a, b)| line_intersection(start, end, a, b))
        .filter(|p| is_point_on_segment(*p, start, end, SEGMENT_TOLERANCE))
        .filter(|p| p.distance(start) > SEGMENT_TOLERANCE && p.distance(end) > SEGMENT_TOLERANCE)
        .min_by(|a, b| a.distance(pick).total_cmp(&b.distance(pick)))?;

    let keep_start = point_to_segment_distance(pick, start, cut) <= point_to_segment_distance(pick, cut, end);
    let (new_start, new_end) = if keep_start { (start, cut) } else { (cut, end) };
    log::debug!("Trimmed line {} at {:?}", target, cut);
    replace_line(doc, target, new_start, new_end)
}

/// Lengthen a line to meet a boundary edge. The intersection must lie on the
/// boundary segment and beyond the line; the endpoint nearer to it moves.
pub fn extend(doc: &CadDocument, target: ObjectId, boundary: ObjectId) -> Option<Changeset> {
    let (start, end) = editable_line(doc, target)?;
    let reach = boundary_edges(doc, boundary)
        .into_iter()
        .filter_map(|(a, b)| {
            let p = line_intersection(start, end, a, b)?;
            is_point_on_segment(p, a, b, SEGMENT_TOLERANCE).then_some(p)
        })
        .filter(|p| !is_point_on_segment(*p, start, end, SEGMENT_TOLERANCE))
        .min_by(|a, b| {
            let da = a.distance(start).min(a.distance(end));
            let db = b.distance(start).min(b.distance(end));
            da.total_cmp(&db)
        })?;

    let (new_start, new_end) = if reach.distance(start) < reach.distance(end) {
        (reach, end)
    } else {
        (start, reach)
    };
    replace_line(doc, target, new_start, new_end)
}

/// Split a line at one point, or remove the part between two points.
///
/// Break points are projected onto the line. Pieces shorter than
/// [`MIN_SEGMENT_LENGTH`] are discarded.
pub fn break_line(doc: &CadDocument, id: ObjectId, first: Point, second: Option<Point>) -> Option<Changeset> {
    let (start, end) = editable_line(doc, id)?;
    let object = doc.get_object(id)?;

    let (p1, t1) = closest_point_on_segment(first, start, end);
    let pieces = match second {
        None => vec![(start, p1), (p1, end)],
        Some(second) => {
            let (p2, t2) = closest_point_on_segment(second, start, end);
            let (near, far) = if t1 <= t2 { (p1, p2) } else { (p2, p1) };
            vec![(start, near), (far, end)]
        }
    };
    let pieces: Vec<(Point, Point)> = pieces
        .into_iter()
        .filter(|(a, b)| a.distance(*b) >= MIN_SEGMENT_LENGTH)
        .collect();
    if pieces == [(start, end)] {
        return None;
    }

    let mut changes = Changeset::default();
    changes.remove(id);
    for (a, b) in pieces {
        changes.add(object.derive(ShapeData::Line { start: a, end: b }));
    }
    Some(changes)
}
