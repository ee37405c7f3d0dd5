//! Fillet and chamfer between two lines.

use super::editable_line;
use crate::document::{CadDocument, Changeset};
use crate::geometry::{chamfer_corner, fillet_corner, line_intersection};
use crate::shapes::{ObjectId, ShapeData};
use kurbo::Point;

/// One of the two lines meeting at a corner.
struct Leg {
    id: ObjectId,
    /// Endpoint farther from the corner; it stays put.
    outer: Point,
    /// Whether `outer` is the line's start point.
    outer_is_start: bool,
    length: f64,
}

impl Leg {
    fn new(id: ObjectId, start: Point, end: Point, corner: Point) -> Self {
        let outer_is_start = start.distance(corner) >= end.distance(corner);
        let outer = if outer_is_start { start } else { end };
        Leg {
            id,
            outer,
            outer_is_start,
            length: outer.distance(corner),
        }
    }

    /// Line data running from the outer endpoint to `trim`, keeping the
    /// original orientation.
    fn trimmed(&self, trim: Point) -> ShapeData {
        if self.outer_is_start {
            ShapeData::Line { start: self.outer, end: trim }
        } else {
            ShapeData::Line { start: trim, end: self.outer }
        }
    }
}

/// Locate the corner of two lines by extending them, with each line's leg.
fn corner_legs(doc: &CadDocument, first: ObjectId, second: ObjectId) -> Option<(Point, Leg, Leg)> {
    if first == second {
        return None;
    }
    let (s1, e1) = editable_line(doc, first)?;
    let (s2, e2) = editable_line(doc, second)?;
    let corner = line_intersection(s1, e1, s2, e2)?;
    Some((corner, Leg::new(first, s1, e1, corner), Leg::new(second, s2, e2, corner)))
}

fn trim_legs(doc: &CadDocument, legs: [(&Leg, Point); 2]) -> Option<Changeset> {
    let mut changes = Changeset::default();
    for (leg, trim) in legs {
        let mut object = doc.get_object(leg.id)?.clone();
        object.data = leg.trimmed(trim);
        changes.update(object);
    }
    Some(changes)
}

/// Round the corner between two lines with an arc of `radius`.
///
/// The lines need not touch; their extensions define the corner. A zero
/// radius trims or extends both lines to the sharp corner. Parallel lines and
/// radii whose tangent points fall beyond either line are rejected.
pub fn fillet(doc: &CadDocument, first: ObjectId, second: ObjectId, radius: f64) -> Option<Changeset> {
    let (corner, leg1, leg2) = corner_legs(doc, first, second)?;
    if radius <= 0.0 {
        return trim_legs(doc, [(&leg1, corner), (&leg2, corner)]);
    }

    let fit = fillet_corner(leg1.outer, corner, leg2.outer, radius)?;
    if fit.tangent_distance > leg1.length || fit.tangent_distance > leg2.length {
        log::debug!("Fillet radius {} does not fit between {} and {}", radius, first, second);
        return None;
    }

    let mut changes = trim_legs(doc, [(&leg1, fit.trim1), (&leg2, fit.trim2)])?;
    let template = doc.get_object(first)?;
    changes.add(template.derive(ShapeData::Arc {
        center: fit.center,
        radius: fit.radius,
        start_angle: fit.start_angle,
        end_angle: fit.end_angle,
    }));
    Some(changes)
}

/// Cut the corner between two lines with a segment `distance1` back along
/// the first line and `distance2` along the second.
pub fn chamfer(
    doc: &CadDocument,
    first: ObjectId,
    second: ObjectId,
    distance1: f64,
    distance2: f64,
) -> Option<Changeset> {
    let (corner, leg1, leg2) = corner_legs(doc, first, second)?;
    if distance1 > leg1.length || distance2 > leg2.length {
        return None;
    }
    let cut = chamfer_corner(leg1.outer, corner, leg2.outer, distance1, distance2)?;

    let mut changes = trim_legs(doc, [(&leg1, cut.trim1), (&leg2, cut.trim2)])?;
    if cut.trim1.distance(cut.trim2) > f64::EPSILON {
        let template = doc.get_object(first)?;
        changes.add(template.derive(ShapeData::Line { start: cut.trim1, end: cut.trim2 }));
    }
    Some(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{arc_point, points_close};
    use crate::shapes::CadObject;

    fn add_line(doc: &mut CadDocument, start: Point, end: Point) -> ObjectId {
        let layer = doc.current_layer_id();
        doc.add_object(CadObject::new(layer, ShapeData::Line { start, end }))
    }

    fn line_length(doc: &CadDocument, id: ObjectId) -> f64 {
        match doc.get_object(id).unwrap().data {
            ShapeData::Line { start, end } => start.distance(end),
            _ => panic!("expected a line"),
        }
    }

    fn corner_doc() -> (CadDocument, ObjectId, ObjectId) {
        let mut doc = CadDocument::new();
        let a = add_line(&mut doc, Point::new(1.0, 0.0), Point::ZERO);
        let b = add_line(&mut doc, Point::ZERO, Point::new(0.0, 1.0));
        (doc, a, b)
    }

    #[test]
    fn test_fillet_unit_corner() {
        let (mut doc, a, b) = corner_doc();
        let changes = fillet(&doc, a, b, 0.3).unwrap();
        assert!(doc.apply(changes));

        assert!((line_length(&doc, a) - 0.7).abs() < 1e-9);
        assert!((line_length(&doc, b) - 0.7).abs() < 1e-9);
        let ShapeData::Line { start, .. } = doc.get_object(a).unwrap().data else {
            unreachable!()
        };
        assert_eq!(start, Point::new(1.0, 0.0));

        let arc = doc.objects_ordered().last().unwrap();
        let ShapeData::Arc { center, radius, start_angle, end_angle } = arc.data else {
            panic!("expected an arc");
        };
        assert!((radius - 0.3).abs() < 1e-12);
        assert!(points_close(center, Point::new(0.3, 0.3), 1e-9));
        let ends = [
            arc_point(center, radius, start_angle),
            arc_point(center, radius, end_angle),
        ];
        assert!(ends.iter().any(|p| points_close(*p, Point::new(0.3, 0.0), 1e-9)));
        assert!(ends.iter().any(|p| points_close(*p, Point::new(0.0, 0.3), 1e-9)));
    }

    #[test]
    fn test_fillet_too_large_is_noop() {
        let (doc, a, b) = corner_doc();
        assert!(fillet(&doc, a, b, 1.5).is_none());
    }

    #[test]
    fn test_fillet_zero_extends_to_corner() {
        let mut doc = CadDocument::new();
        let a = add_line(&mut doc, Point::new(10.0, 0.0), Point::new(2.0, 0.0));
        let b = add_line(&mut doc, Point::new(0.0, 3.0), Point::new(0.0, 10.0));
        doc.apply(fillet(&doc, a, b, 0.0).unwrap());
        assert_eq!(doc.object_count(), 2);
        assert_eq!(
            doc.get_object(a).unwrap().data,
            ShapeData::Line { start: Point::new(10.0, 0.0), end: Point::ZERO }
        );
        assert_eq!(
            doc.get_object(b).unwrap().data,
            ShapeData::Line { start: Point::ZERO, end: Point::new(0.0, 10.0) }
        );
    }

    #[test]
    fn test_fillet_parallel_rejected() {
        let mut doc = CadDocument::new();
        let a = add_line(&mut doc, Point::ZERO, Point::new(5.0, 0.0));
        let b = add_line(&mut doc, Point::new(0.0, 1.0), Point::new(5.0, 1.0));
        assert!(fillet(&doc, a, b, 0.5).is_none());
    }

    #[test]
    fn test_chamfer_adds_cut_line() {
        let (mut doc, a, b) = corner_doc();
        doc.apply(chamfer(&doc, a, b, 0.2, 0.4).unwrap());
        assert!((line_length(&doc, a) - 0.8).abs() < 1e-9);
        assert!((line_length(&doc, b) - 0.6).abs() < 1e-9);
        assert_eq!(doc.object_count(), 3);
    }
}
