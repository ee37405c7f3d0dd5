//! Point sampling for curved and multi-vertex shapes.

use super::{angle, rotate_vector};
use kurbo::{Point, Vec2};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Samples per Catmull-Rom span.
pub const DEFAULT_SPLINE_SEGMENTS: usize = 50;

/// Samples around a full ellipse.
pub const DEFAULT_ELLIPSE_SEGMENTS: usize = 64;

/// Vertices of a regular polygon.
///
/// Vertex `i` sits at `rotation + i * 2π/sides - π/2`, so an unrotated polygon
/// has its first vertex pointing up on a y-down canvas.
pub fn generate_polygon_points(center: Point, radius: f64, sides: u32, rotation: f64) -> Vec<Point> {
    if sides == 0 {
        return Vec::new();
    }
    let step = TAU / sides as f64;
    (0..sides)
        .map(|i| {
            let a = rotation + i as f64 * step - FRAC_PI_2;
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// Catmull-Rom interpolation through `control_points`.
///
/// Fewer than three control points are returned unchanged (a single point or a
/// straight segment).
pub fn calculate_spline_points(control_points: &[Point], segments: usize) -> Vec<Point> {
    if control_points.len() <= 2 || segments == 0 {
        return control_points.to_vec();
    }

    let n = control_points.len();
    let mut result = Vec::with_capacity((n - 1) * segments + 1);

    for i in 0..n - 1 {
        let p0 = control_points[i.saturating_sub(1)];
        let p1 = control_points[i];
        let p2 = control_points[i + 1];
        let p3 = control_points[(i + 2).min(n - 1)];

        for j in 0..segments {
            let t = j as f64 / segments as f64;
            result.push(catmull_rom(p0, p1, p2, p3, t));
        }
    }

    result.push(control_points[n - 1]);
    result
}

fn catmull_rom(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let t2 = t * t;
    let t3 = t2 * t;
    let blend = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * ((2.0 * b)
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    Point::new(
        blend(p0.x, p1.x, p2.x, p3.x),
        blend(p0.y, p1.y, p2.y, p3.y),
    )
}

/// Closed ring of points around a rotated ellipse. The last point repeats the first.
pub fn calculate_ellipse_points(
    center: Point,
    major_radius: f64,
    minor_radius: f64,
    rotation: f64,
    segments: usize,
) -> Vec<Point> {
    let segments = segments.max(3);
    (0..=segments)
        .map(|i| {
            let t = TAU * (i % segments) as f64 / segments as f64;
            let local = Vec2::new(major_radius * t.cos(), minor_radius * t.sin());
            center + rotate_vector(local, rotation)
        })
        .collect()
}

/// A point sampled along a path, with the direction of travel there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub point: Point,
    /// Tangent angle of the segment containing the point, in radians.
    pub angle: f64,
}

/// Locate the point at `fraction` of the total length of `points`.
///
/// `fraction` is clamped to `[0, 1]`; `1.0` returns the final point exactly.
pub fn point_on_path(points: &[Point], fraction: f64) -> Option<PathSample> {
    match points.len() {
        0 => return None,
        1 => {
            return Some(PathSample { point: points[0], angle: 0.0 });
        }
        _ => {}
    }

    let fraction = fraction.clamp(0.0, 1.0);
    let last = points.len() - 1;
    if fraction >= 1.0 {
        return Some(PathSample {
            point: points[last],
            angle: angle(points[last - 1], points[last]),
        });
    }

    let total: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    if total < f64::EPSILON {
        return Some(PathSample { point: points[0], angle: 0.0 });
    }

    let target = total * fraction;
    let mut walked = 0.0;
    for w in points.windows(2) {
        let seg_len = w[0].distance(w[1]);
        if seg_len > 0.0 && walked + seg_len >= target {
            let t = (target - walked) / seg_len;
            return Some(PathSample {
                point: w[0].lerp(w[1], t),
                angle: angle(w[0], w[1]),
            });
        }
        walked += seg_len;
    }

    Some(PathSample {
        point: points[last],
        angle: angle(points[last - 1], points[last]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_polygon_first_vertex_points_up() {
        let pts = generate_polygon_points(Point::ZERO, 2.0, 4, 0.0);
        assert_eq!(pts.len(), 4);
        assert!((pts[0].x).abs() < 1e-12);
        assert!((pts[0].y + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_spline_passes_through_control_points() {
        let ctrl = [Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(20.0, 0.0)];
        let pts = calculate_spline_points(&ctrl, 10);
        assert_eq!(pts.len(), 21);
        assert_eq!(pts[0], ctrl[0]);
        assert!(pts[10].distance(ctrl[1]) < 1e-9);
        assert_eq!(*pts.last().unwrap(), ctrl[2]);
    }

    #[test]
    fn test_spline_two_points_is_linear() {
        let ctrl = [Point::new(0.0, 0.0), Point::new(5.0, 5.0)];
        assert_eq!(calculate_spline_points(&ctrl, DEFAULT_SPLINE_SEGMENTS), ctrl.to_vec());
    }

    #[test]
    fn test_ellipse_ring_is_closed() {
        let pts = calculate_ellipse_points(Point::new(1.0, 1.0), 4.0, 2.0, PI / 2.0, 16);
        assert_eq!(pts.len(), 17);
        assert_eq!(pts[0], pts[16]);
        // Major axis rotated onto +y.
        assert!(pts[0].distance(Point::new(1.0, 5.0)) < 1e-9);
    }

    #[test]
    fn test_point_on_path_midway() {
        let path = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let sample = point_on_path(&path, 0.75).unwrap();
        assert!(sample.point.distance(Point::new(10.0, 5.0)) < 1e-9);
        assert!((sample.angle - PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_on_path_end() {
        let path = [Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
        let sample = point_on_path(&path, 1.0).unwrap();
        assert_eq!(sample.point, Point::new(3.0, 4.0));
        assert!(point_on_path(&[], 0.5).is_none());
    }
}
