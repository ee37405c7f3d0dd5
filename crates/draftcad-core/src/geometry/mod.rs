//! Geometric kernel: pure functions over points and shape data.
//!
//! Everything in here is stateless. Angles are radians unless a name says
//! otherwise, and all coordinates are world coordinates.

mod corner;
mod offset;
mod sampling;
mod transform;

pub use corner::{ChamferResult, FilletResult, chamfer_corner, fillet_corner};
pub use offset::{offset_arc, offset_circle, offset_line, offset_polyline};
pub use sampling::{
    DEFAULT_ELLIPSE_SEGMENTS, DEFAULT_SPLINE_SEGMENTS, PathSample, calculate_ellipse_points,
    calculate_spline_points, generate_polygon_points, point_on_path,
};
pub use transform::{
    Transform, mirror_object_data, offset_object_data, rotate_object_data, scale_object_data,
};

use kurbo::{Affine, Point, Vec2};
use std::f64::consts::TAU;

/// Cross products below this magnitude are treated as parallel lines.
pub const PARALLEL_EPSILON: f64 = 1e-4;

/// Default slack used by [`is_point_on_segment`].
pub const SEGMENT_TOLERANCE: f64 = 1e-3;

/// Distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Midpoint of two points.
pub fn midpoint(a: Point, b: Point) -> Point {
    a.midpoint(b)
}

/// Angle of the vector `from -> to`, in radians (`atan2` range).
pub fn angle(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Rotate `p` around `center` by `angle` radians (counter-clockwise in a y-up frame).
pub fn rotate_point(p: Point, center: Point, angle: f64) -> Point {
    Affine::rotate_about(angle, center) * p
}

/// Scale `p` away from `center` by `factor`.
pub fn scale_point(p: Point, center: Point, factor: f64) -> Point {
    center + (p - center) * factor
}

/// Reflect `p` across the infinite line through `line_start` and `line_end`.
///
/// A degenerate mirror line leaves the point where it is.
pub fn mirror_point(p: Point, line_start: Point, line_end: Point) -> Point {
    let foot = project_onto_line(p, line_start, line_end);
    Point::new(2.0 * foot.x - p.x, 2.0 * foot.y - p.y)
}

/// Translate `p` by `delta`.
pub fn offset_point(p: Point, delta: Vec2) -> Point {
    p + delta
}

/// Rotate a free vector (no pivot).
pub fn rotate_vector(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Unit vector of `v`, or `None` when it has no length.
pub fn unit(v: Vec2) -> Option<Vec2> {
    let len = v.hypot();
    if len < f64::EPSILON { None } else { Some(v / len) }
}

/// Orthogonal projection of `p` onto the infinite line through `a` and `b`.
pub fn project_onto_line(p: Point, a: Point, b: Point) -> Point {
    let d = b - a;
    let len_sq = d.hypot2();
    if len_sq < f64::EPSILON {
        return p;
    }
    let t = (p - a).dot(d) / len_sq;
    a + d * t
}

/// Closest point to `p` on the segment `a -> b`, together with its parameter in `[0, 1]`.
pub fn closest_point_on_segment(p: Point, a: Point, b: Point) -> (Point, f64) {
    let d = b - a;
    let len_sq = d.hypot2();
    if len_sq < f64::EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(d) / len_sq).clamp(0.0, 1.0);
    (a + d * t, t)
}

/// Distance from a point to a line segment.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    closest_point_on_segment(p, a, b).0.distance(p)
}

/// Distance from a point to the infinite line through `a` and `b`.
pub fn point_to_line_distance(p: Point, a: Point, b: Point) -> f64 {
    let d = b - a;
    let len = d.hypot();
    if len < f64::EPSILON {
        return p.distance(a);
    }
    d.cross(p - a).abs() / len
}

/// Intersection of the infinite lines `p1-p2` and `p3-p4`.
///
/// Returns `None` when the lines are parallel. The result is not clipped to
/// either segment; use [`is_point_on_segment`] for that.
pub fn line_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let denom = d1.cross(d2);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (p3 - p1).cross(d2) / denom;
    Some(p1 + d1 * t)
}

/// Whether `p` lies on the segment `a -> b`, by comparing the summed distance
/// to both endpoints against the segment length.
pub fn is_point_on_segment(p: Point, a: Point, b: Point, tolerance: f64) -> bool {
    (p.distance(a) + p.distance(b) - a.distance(b)).abs() <= tolerance
}

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Whether `angle` falls on the counter-clockwise sweep from `start` to `end`.
pub fn angle_in_arc_range(angle: f64, start: f64, end: f64) -> bool {
    let sweep = normalize_angle(end - start);
    let offset = normalize_angle(angle - start);
    if sweep == 0.0 {
        // Zero sweep is a full circle.
        return true;
    }
    offset <= sweep + 1e-9
}

/// Point on a circle at the given angle.
pub fn arc_point(center: Point, radius: f64, angle: f64) -> Point {
    Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

/// Total length of an open point sequence.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Approximate float equality for points.
pub fn points_close(a: Point, b: Point, tolerance: f64) -> bool {
    a.distance(b) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(a: Point, b: Point) -> bool {
        points_close(a, b, 1e-9)
    }

    #[test]
    fn test_distance_midpoint_angle() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((distance(a, b) - 5.0).abs() < 1e-12);
        assert_eq!(midpoint(a, b), Point::new(1.5, 2.0));
        assert!((angle(a, Point::new(0.0, 2.0)) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_point_quarter_turn() {
        let p = rotate_point(Point::new(2.0, 1.0), Point::new(1.0, 1.0), FRAC_PI_2);
        assert!(close(p, Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_scale_point() {
        let p = scale_point(Point::new(2.0, 2.0), Point::new(1.0, 1.0), 3.0);
        assert!(close(p, Point::new(4.0, 4.0)));
    }

    #[test]
    fn test_mirror_point_diagonal() {
        let p = mirror_point(Point::new(1.0, 0.0), Point::ZERO, Point::new(1.0, 1.0));
        assert!(close(p, Point::new(0.0, 1.0)));
    }

    #[test]
    fn test_mirror_point_degenerate_line() {
        let p = Point::new(3.0, -2.0);
        assert_eq!(mirror_point(p, Point::ZERO, Point::ZERO), p);
    }

    #[test]
    fn test_line_intersection_crossing_segments() {
        let (a, b) = (Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let (c, d) = (Point::new(0.0, 10.0), Point::new(10.0, 0.0));
        let ip = line_intersection(a, b, c, d).unwrap();
        assert!(close(ip, Point::new(5.0, 5.0)));
        assert!(is_point_on_segment(ip, a, b, SEGMENT_TOLERANCE));
        assert!(is_point_on_segment(ip, c, d, SEGMENT_TOLERANCE));
    }

    #[test]
    fn test_line_intersection_parallel() {
        let result = line_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(10.0, 1.0),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_line_intersection_is_unbounded() {
        let ip = line_intersection(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(5.0, -1.0),
            Point::new(5.0, 1.0),
        )
        .unwrap();
        assert!(close(ip, Point::new(5.0, 0.0)));
        assert!(!is_point_on_segment(ip, Point::new(0.0, 0.0), Point::new(1.0, 0.0), SEGMENT_TOLERANCE));
    }

    #[test]
    fn test_closest_point_on_segment_clamps() {
        let (p, t) = closest_point_on_segment(Point::new(-5.0, 3.0), Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(p, Point::ZERO);
        assert_eq!(t, 0.0);
        assert!((point_to_segment_distance(Point::new(5.0, 3.0), Point::ZERO, Point::new(10.0, 0.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_angle_in_arc_range_wraps() {
        assert!(angle_in_arc_range(0.0, 1.5 * PI, 0.5 * PI));
        assert!(!angle_in_arc_range(PI, 1.5 * PI, 0.5 * PI));
        assert!(angle_in_arc_range(PI, 0.0, PI));
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(-FRAC_PI_2) - 1.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < 1e-9);
    }
}
