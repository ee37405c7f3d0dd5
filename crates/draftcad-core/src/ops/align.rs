//! Align objects by source/destination point pairs.

use crate::document::{CadDocument, Changeset};
use crate::geometry::Transform;
use crate::shapes::ObjectId;
use kurbo::Point;

/// Transform chain mapping source points onto destination points.
///
/// One pair translates. A second pair adds a rotation about the first
/// destination so the source direction matches the destination direction.
/// A third pair also scales about the first destination by the ratio of the
/// two pair distances. Returns `None` for no pairs, more than three, or
/// coincident first and second source points.
pub fn align_transforms(pairs: &[(Point, Point)]) -> Option<Vec<Transform>> {
    let (&(src1, dst1), rest) = pairs.split_first()?;
    if rest.len() > 2 {
        return None;
    }
    let mut chain = vec![Transform::Translate(dst1 - src1)];
    let Some(&(src2, dst2)) = rest.first() else {
        return Some(chain);
    };

    let from = src2 - src1;
    let to = dst2 - dst1;
    if from.hypot() < f64::EPSILON || to.hypot() < f64::EPSILON {
        return None;
    }
    let angle = to.atan2() - from.atan2();
    if angle.abs() > f64::EPSILON {
        chain.push(Transform::Rotate { center: dst1, angle });
    }
    if rest.len() == 2 {
        let factor = to.hypot() / from.hypot();
        if (factor - 1.0).abs() > f64::EPSILON {
            chain.push(Transform::Scale { center: dst1, factor });
        }
    }
    Some(chain)
}

/// Align the editable objects among `ids` in place.
pub fn align(doc: &CadDocument, ids: &[ObjectId], pairs: &[(Point, Point)]) -> Option<Changeset> {
    let chain = align_transforms(pairs)?;
    let mut changes = Changeset::default();
    for object in ids.iter().filter_map(|id| doc.get_object(*id)) {
        if doc.is_editable(object) {
            let moved = chain.iter().fold(object.clone(), |acc, t| t.apply_object(&acc));
            changes.update(moved);
        }
    }
    (!changes.is_empty()).then_some(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::points_close;
    use crate::shapes::{CadObject, ShapeData};

    fn add_line(doc: &mut CadDocument, start: Point, end: Point) -> ObjectId {
        let layer = doc.current_layer_id();
        doc.add_object(CadObject::new(layer, ShapeData::Line { start, end }))
    }

    fn endpoints(doc: &CadDocument, id: ObjectId) -> (Point, Point) {
        match doc.get_object(id).unwrap().data {
            ShapeData::Line { start, end } => (start, end),
            _ => panic!("expected a line"),
        }
    }

    #[test]
    fn test_align_one_pair_translates() {
        let mut doc = CadDocument::new();
        let id = add_line(&mut doc, Point::ZERO, Point::new(1.0, 0.0));
        doc.apply(align(&doc, &[id], &[(Point::ZERO, Point::new(5.0, 5.0))]).unwrap());
        assert_eq!(endpoints(&doc, id), (Point::new(5.0, 5.0), Point::new(6.0, 5.0)));
    }

    #[test]
    fn test_align_two_pairs_rotates_without_scaling() {
        let mut doc = CadDocument::new();
        let id = add_line(&mut doc, Point::ZERO, Point::new(2.0, 0.0));
        let pairs = [
            (Point::ZERO, Point::new(10.0, 0.0)),
            (Point::new(2.0, 0.0), Point::new(10.0, 5.0)),
        ];
        doc.apply(align(&doc, &[id], &pairs).unwrap());
        let (start, end) = endpoints(&doc, id);
        assert!(points_close(start, Point::new(10.0, 0.0), 1e-9));
        assert!(points_close(end, Point::new(10.0, 2.0), 1e-9));
    }

    #[test]
    fn test_align_three_pairs_scales() {
        let mut doc = CadDocument::new();
        let id = add_line(&mut doc, Point::ZERO, Point::new(2.0, 0.0));
        let pairs = [
            (Point::ZERO, Point::new(10.0, 0.0)),
            (Point::new(2.0, 0.0), Point::new(10.0, 5.0)),
            (Point::new(0.0, 1.0), Point::new(9.0, 0.0)),
        ];
        doc.apply(align(&doc, &[id], &pairs).unwrap());
        let (start, end) = endpoints(&doc, id);
        assert!(points_close(start, Point::new(10.0, 0.0), 1e-9));
        assert!(points_close(end, Point::new(10.0, 5.0), 1e-9));
    }

    #[test]
    fn test_align_rejects_degenerate_pairs() {
        assert!(align_transforms(&[]).is_none());
        assert!(align_transforms(&[(Point::ZERO, Point::ZERO), (Point::ZERO, Point::new(1.0, 0.0))]).is_none());
        let four = [(Point::ZERO, Point::ZERO); 4];
        assert!(align_transforms(&four).is_none());
    }
}
