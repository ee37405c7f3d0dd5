//! Parallel offsets of lines, circles, arcs and polylines.

use kurbo::{Point, Vec2};

/// Left-hand unit normal of `a -> b`, if the segment has length.
fn segment_normal(a: Point, b: Point) -> Option<Vec2> {
    let d = b - a;
    let len = d.hypot();
    if len < f64::EPSILON {
        None
    } else {
        Some(Vec2::new(-d.y / len, d.x / len))
    }
}

/// Translate a line perpendicular to itself. Positive distances move it to the
/// left of `start -> end`. Zero-length lines have no normal and yield `None`.
pub fn offset_line(start: Point, end: Point, distance: f64) -> Option<(Point, Point)> {
    let n = segment_normal(start, end)? * distance;
    Some((start + n, end + n))
}

/// New circle radius after an outward (positive) or inward (negative) offset, clamped at zero.
pub fn offset_circle(radius: f64, delta: f64) -> f64 {
    (radius + delta).max(0.0)
}

/// New arc radius after an offset; the sweep angles are unchanged.
pub fn offset_arc(radius: f64, delta: f64) -> f64 {
    offset_circle(radius, delta)
}

/// Mitred offset of a polyline.
///
/// Interior vertices move along the bisector of the adjacent edge normals by
/// `offset / cos(half_angle)`. Open endpoints use their single edge normal.
/// Zero-length edges borrow the nearest valid normal before or after them.
pub fn offset_polyline(points: &[Point], offset: f64, closed: bool) -> Vec<Point> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }

    let edge_count = if closed { n } else { n - 1 };
    let raw: Vec<Option<Vec2>> = (0..edge_count)
        .map(|i| segment_normal(points[i], points[(i + 1) % n]))
        .collect();

    // Fill degenerate edges from the previous valid normal, then the next one.
    let mut normals: Vec<Option<Vec2>> = raw.clone();
    let mut last_valid = None;
    for slot in normals.iter_mut() {
        match slot {
            Some(v) => last_valid = Some(*v),
            None => *slot = last_valid,
        }
    }
    let mut next_valid = None;
    for (slot, original) in normals.iter_mut().zip(raw.iter()).rev() {
        match original {
            Some(v) => next_valid = Some(*v),
            None if slot.is_none() => *slot = next_valid,
            None => {}
        }
    }

    if normals.iter().all(Option::is_none) {
        return points.to_vec();
    }
    let normals: Vec<Vec2> = normals.into_iter().map(|v| v.unwrap_or(Vec2::ZERO)).collect();

    (0..n)
        .map(|i| {
            let incoming = if i > 0 {
                Some(normals[i - 1])
            } else if closed {
                Some(normals[edge_count - 1])
            } else {
                None
            };
            let outgoing = if i < edge_count { Some(normals[i]) } else { None };

            let shift = match (incoming, outgoing) {
                (Some(a), Some(b)) => miter(a, b, offset),
                (Some(a), None) => a * offset,
                (None, Some(b)) => b * offset,
                (None, None) => Vec2::ZERO,
            };
            points[i] + shift
        })
        .collect()
}

fn miter(a: Vec2, b: Vec2, offset: f64) -> Vec2 {
    let sum = a + b;
    let len = sum.hypot();
    if len < 1e-9 {
        // Edges fold back on themselves; fall back to the incoming normal.
        return a * offset;
    }
    let bisector = sum / len;
    let cos_half = bisector.dot(a);
    if cos_half.abs() < 1e-9 {
        return a * offset;
    }
    bisector * (offset / cos_half)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_line_left() {
        let (s, e) = offset_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 2.0).unwrap();
        assert_eq!(s, Point::new(0.0, 2.0));
        assert_eq!(e, Point::new(10.0, 2.0));
        assert!(offset_line(Point::ZERO, Point::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_offset_circle_clamps() {
        assert_eq!(offset_circle(5.0, 2.0), 7.0);
        assert_eq!(offset_circle(1.0, -3.0), 0.0);
        assert_eq!(offset_arc(4.0, -1.0), 3.0);
    }

    #[test]
    fn test_offset_polyline_right_angle() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let out = offset_polyline(&pts, 1.0, false);
        assert!(out[0].distance(Point::new(0.0, 1.0)) < 1e-9);
        // Mitre at the corner sits on the inside of the left turn.
        assert!(out[1].distance(Point::new(9.0, 1.0)) < 1e-9);
        assert!(out[2].distance(Point::new(9.0, 10.0)) < 1e-9);
    }

    #[test]
    fn test_offset_polyline_skips_zero_length_edge() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
        ];
        let out = offset_polyline(&pts, 2.0, false);
        for p in out {
            assert!((p.y - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_offset_closed_square_outward() {
        // Clockwise square, so the left normal points outward.
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ];
        let out = offset_polyline(&pts, 1.0, true);
        assert!(out[0].distance(Point::new(-1.0, -1.0)) < 1e-9);
        assert!(out[2].distance(Point::new(11.0, 11.0)) < 1e-9);
    }
}
