//! Join chained lines into one polyline.

use crate::document::{CadDocument, Changeset};
use crate::shapes::{CadObject, ObjectId, ShapeData};
use kurbo::Point;
use std::collections::VecDeque;

/// Endpoints closer than this are treated as shared.
pub const JOIN_TOLERANCE: f64 = 0.1;

fn touches(a: Point, b: Point) -> bool {
    a.distance(b) <= JOIN_TOLERANCE
}

/// Chain lines into a single polyline.
///
/// Starting from the first line, lines sharing an endpoint with either end
/// of the chain are added greedily until none fit. Lines that never connect
/// stay as they are. A chain whose ends meet becomes a closed polyline.
/// Returns `None` if fewer than two lines chain together.
pub fn join(doc: &CadDocument, ids: &[ObjectId]) -> Option<Changeset> {
    let mut lines: Vec<(&CadObject, Point, Point)> = ids
        .iter()
        .filter_map(|id| doc.get_object(*id))
        .filter(|o| doc.is_editable(o))
        .filter_map(|o| match o.data {
            ShapeData::Line { start, end } => Some((o, start, end)),
            _ => None,
        })
        .collect();
    if lines.len() < 2 {
        return None;
    }

    let (first, start, end) = lines.remove(0);
    let mut chain: VecDeque<Point> = VecDeque::from([start, end]);
    let mut consumed = vec![first.id];

    loop {
        let head = chain[0];
        let tail = chain[chain.len() - 1];
        let next = lines.iter().position(|(_, s, e)| {
            touches(*s, tail) || touches(*e, tail) || touches(*s, head) || touches(*e, head)
        });
        let Some(index) = next else {
            break;
        };
        let (object, s, e) = lines.remove(index);
        consumed.push(object.id);
        if touches(s, tail) {
            chain.push_back(e);
        } else if touches(e, tail) {
            chain.push_back(s);
        } else if touches(e, head) {
            chain.push_front(s);
        } else {
            chain.push_front(e);
        }
    }

    if consumed.len() < 2 {
        return None;
    }
    let mut points: Vec<Point> = chain.into();
    let closed = points.len() > 3 && touches(points[0], points[points.len() - 1]);
    if closed {
        points.pop();
    }

    log::debug!("Joined {} lines into a {} polyline", consumed.len(), if closed { "closed" } else { "open" });
    let mut changes = Changeset::default();
    changes.removed = consumed;
    changes.add(first.derive(ShapeData::Polyline { points, closed }));
    Some(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_line(doc: &mut CadDocument, a: (f64, f64), b: (f64, f64)) -> ObjectId {
        let layer = doc.current_layer_id();
        doc.add_object(CadObject::new(
            layer,
            ShapeData::Line { start: Point::new(a.0, a.1), end: Point::new(b.0, b.1) },
        ))
    }

    fn polyline(doc: &CadDocument) -> (Vec<Point>, bool) {
        doc.objects_ordered()
            .find_map(|o| match &o.data {
                ShapeData::Polyline { points, closed } => Some((points.clone(), *closed)),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_join_three_lines_open() {
        let mut doc = CadDocument::new();
        let ids = vec![
            add_line(&mut doc, (0.0, 0.0), (1.0, 0.0)),
            add_line(&mut doc, (1.0, 0.0), (1.0, 1.0)),
            add_line(&mut doc, (1.0, 1.0), (0.0, 1.0)),
        ];
        assert!(doc.apply(join(&doc, &ids).unwrap()));
        assert_eq!(doc.object_count(), 1);
        let (points, closed) = polyline(&doc);
        assert_eq!(
            points,
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0), Point::new(0.0, 1.0)]
        );
        assert!(!closed);
    }

    #[test]
    fn test_join_detects_closure_and_reversed_lines() {
        let mut doc = CadDocument::new();
        let ids = vec![
            add_line(&mut doc, (0.0, 0.0), (4.0, 0.0)),
            add_line(&mut doc, (4.0, 4.0), (4.0, 0.05)),
            add_line(&mut doc, (0.0, 4.0), (0.0, 0.0)),
            add_line(&mut doc, (4.0, 4.0), (0.0, 4.0)),
        ];
        doc.apply(join(&doc, &ids).unwrap());
        let (points, closed) = polyline(&doc);
        assert!(closed);
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_join_leaves_disconnected_lines() {
        let mut doc = CadDocument::new();
        let a = add_line(&mut doc, (0.0, 0.0), (1.0, 0.0));
        let b = add_line(&mut doc, (1.0, 0.0), (2.0, 0.0));
        let stray = add_line(&mut doc, (10.0, 10.0), (11.0, 10.0));
        doc.apply(join(&doc, &[a, b, stray]).unwrap());
        assert_eq!(doc.object_count(), 2);
        assert!(doc.get_object(stray).is_some());
    }

    #[test]
    fn test_join_needs_two_connected_lines() {
        let mut doc = CadDocument::new();
        let a = add_line(&mut doc, (0.0, 0.0), (1.0, 0.0));
        let b = add_line(&mut doc, (5.0, 0.0), (6.0, 0.0));
        assert!(join(&doc, &[a, b]).is_none());
        assert!(join(&doc, &[a]).is_none());
    }
}
