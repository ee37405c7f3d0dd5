//! Stretch vertices inside a crossing window.

use crate::document::{CadDocument, Changeset};
use crate::geometry::Transform;
use crate::shapes::{ObjectId, ShapeData};
use kurbo::{Point, Rect, Vec2};

fn inside(window: Rect, p: Point) -> bool {
    p.x >= window.x0 && p.x <= window.x1 && p.y >= window.y0 && p.y <= window.y1
}

fn shift(p: Point, window: Rect, d: Vec2) -> Point {
    if inside(window, p) { p + d } else { p }
}

/// New shape data after stretching, or `None` when nothing moves.
fn stretch_data(data: &ShapeData, window: Rect, d: Vec2) -> Option<ShapeData> {
    let stretched = match data {
        ShapeData::Line { start, end } => ShapeData::Line {
            start: shift(*start, window, d),
            end: shift(*end, window, d),
        },
        ShapeData::Polyline { points, closed } => ShapeData::Polyline {
            points: points.iter().map(|p| shift(*p, window, d)).collect(),
            closed: *closed,
        },
        ShapeData::Spline { control_points, degree } => ShapeData::Spline {
            control_points: control_points.iter().map(|p| shift(*p, window, d)).collect(),
            degree: *degree,
        },
        ShapeData::Rectangle { corner1: c1, corner2: c2 } => {
            // Each coordinate moves if either corner using it is inside, so
            // the result stays axis aligned.
            let hit = |p: Point| inside(window, p);
            let (x1, y1, x2, y2) = (
                hit(*c1) || hit(Point::new(c1.x, c2.y)),
                hit(*c1) || hit(Point::new(c2.x, c1.y)),
                hit(*c2) || hit(Point::new(c2.x, c1.y)),
                hit(*c2) || hit(Point::new(c1.x, c2.y)),
            );
            ShapeData::Rectangle {
                corner1: Point::new(c1.x + if x1 { d.x } else { 0.0 }, c1.y + if y1 { d.y } else { 0.0 }),
                corner2: Point::new(c2.x + if x2 { d.x } else { 0.0 }, c2.y + if y2 { d.y } else { 0.0 }),
            }
        }
        other => Transform::Translate(d).apply(other),
    };
    (stretched != *data).then_some(stretched)
}

/// Move the vertices of `ids` that lie inside `window` by `displacement`.
///
/// Lines, polylines, splines and rectangles move only their enclosed
/// vertices. Other shapes have no editable vertices and move whole.
pub fn stretch(doc: &CadDocument, ids: &[ObjectId], window: Rect, displacement: Vec2) -> Option<Changeset> {
    let window = window.abs();
    let mut changes = Changeset::default();
    for object in ids.iter().filter_map(|id| doc.get_object(*id)) {
        if !doc.is_editable(object) {
            continue;
        }
        if let Some(data) = stretch_data(&object.data, window, displacement) {
            let mut updated = object.clone();
            updated.data = data;
            changes.update(updated);
        }
    }
    (!changes.is_empty()).then_some(changes)
}
