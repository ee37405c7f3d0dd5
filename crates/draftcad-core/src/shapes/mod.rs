//! Shape data: the geometry payload of every CAD object.

mod object;

pub use object::{CadObject, LineType, ObjectId, SerializableColor};

use crate::array::ArrayParams;
use crate::block::BlockId;
use crate::geometry::{
    self, DEFAULT_ELLIPSE_SEGMENTS, DEFAULT_SPLINE_SEGMENTS, arc_point, calculate_ellipse_points,
    calculate_spline_points, generate_polygon_points, normalize_angle, point_to_segment_distance,
};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Discriminant of [`ShapeData`], used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Polyline,
    Circle,
    Arc,
    Rectangle,
    Polygon,
    Spline,
    Ellipse,
    XLine,
    Ray,
    Text,
    Dimension,
    BlockRef,
    ArrayRef,
}

/// Measurement style of a dimension object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DimensionKind {
    Horizontal,
    Vertical,
    #[default]
    Aligned,
    Radius,
    Diameter,
    Angular,
}

/// Tagged value attached to a block or block reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAttribute {
    pub tag: String,
    pub value: String,
}

/// Geometry of a CAD object, one variant per object kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeData {
    Line {
        start: Point,
        end: Point,
    },
    Polyline {
        points: Vec<Point>,
        closed: bool,
    },
    Circle {
        center: Point,
        radius: f64,
    },
    /// Counter-clockwise from `start_angle` to `end_angle` (radians).
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    /// Axis-aligned rectangle spanned by two opposite corners.
    Rectangle {
        corner1: Point,
        corner2: Point,
    },
    Polygon {
        center: Point,
        radius: f64,
        sides: u32,
        rotation: f64,
    },
    Spline {
        control_points: Vec<Point>,
        degree: u32,
    },
    Ellipse {
        center: Point,
        major_radius: f64,
        minor_radius: f64,
        rotation: f64,
    },
    /// Construction line, infinite in both directions.
    XLine {
        point: Point,
        direction: Vec2,
    },
    /// Semi-infinite line starting at `point`.
    Ray {
        point: Point,
        direction: Vec2,
    },
    Text {
        position: Point,
        content: String,
        height: f64,
        rotation: f64,
    },
    Dimension {
        kind: DimensionKind,
        points: Vec<Point>,
        text_position: Point,
    },
    BlockRef {
        block_id: BlockId,
        insertion_point: Point,
        scale: f64,
        rotation: f64,
        #[serde(default)]
        attributes: Vec<BlockAttribute>,
    },
    /// Array whose instances are regenerated from `source_objects` on every read.
    ArrayRef {
        source_objects: Vec<CadObject>,
        associative: bool,
        params: ArrayParams,
    },
}

/// Four corners of the rectangle spanned by `c1` and `c2`, in drawing order.
pub fn rectangle_corners(c1: Point, c2: Point) -> [Point; 4] {
    [c1, Point::new(c2.x, c1.y), c2, Point::new(c1.x, c2.y)]
}

fn bounds_of(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

fn segments_touch_rect(points: &[Point], rect: Rect) -> bool {
    if points.iter().any(|p| rect.contains(*p)) {
        return true;
    }
    let c = rectangle_corners(Point::new(rect.x0, rect.y0), Point::new(rect.x1, rect.y1));
    points.windows(2).any(|w| {
        (0..4).any(|i| segments_cross(w[0], w[1], c[i], c[(i + 1) % 4]))
    })
}

/// Proper crossing of segments `a-b` and `c-d`.
fn segments_cross(a: Point, b: Point, c: Point, d: Point) -> bool {
    let side = |o: Point, p: Point, q: Point| (p - o).cross(q - o);
    let d1 = side(c, d, a);
    let d2 = side(c, d, b);
    let d3 = side(a, b, c);
    let d4 = side(a, b, d);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

fn closed_ring(mut points: Vec<Point>) -> Vec<Point> {
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

fn arc_samples(center: Point, radius: f64, start: f64, end: f64) -> Vec<Point> {
    let mut sweep = normalize_angle(end - start);
    if sweep == 0.0 {
        sweep = TAU;
    }
    let steps = ((sweep / TAU) * DEFAULT_ELLIPSE_SEGMENTS as f64).ceil().max(8.0) as usize;
    (0..=steps)
        .map(|i| arc_point(center, radius, start + sweep * i as f64 / steps as f64))
        .collect()
}

impl ShapeData {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeData::Line { .. } => ShapeKind::Line,
            ShapeData::Polyline { .. } => ShapeKind::Polyline,
            ShapeData::Circle { .. } => ShapeKind::Circle,
            ShapeData::Arc { .. } => ShapeKind::Arc,
            ShapeData::Rectangle { .. } => ShapeKind::Rectangle,
            ShapeData::Polygon { .. } => ShapeKind::Polygon,
            ShapeData::Spline { .. } => ShapeKind::Spline,
            ShapeData::Ellipse { .. } => ShapeKind::Ellipse,
            ShapeData::XLine { .. } => ShapeKind::XLine,
            ShapeData::Ray { .. } => ShapeKind::Ray,
            ShapeData::Text { .. } => ShapeKind::Text,
            ShapeData::Dimension { .. } => ShapeKind::Dimension,
            ShapeData::BlockRef { .. } => ShapeKind::BlockRef,
            ShapeData::ArrayRef { .. } => ShapeKind::ArrayRef,
        }
    }

    /// Editable vertices (stretch, explode).
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            ShapeData::Line { start, end } => vec![*start, *end],
            ShapeData::Polyline { points, .. } => points.clone(),
            ShapeData::Rectangle { corner1, corner2 } => rectangle_corners(*corner1, *corner2).to_vec(),
            ShapeData::Polygon { center, radius, sides, rotation } => {
                generate_polygon_points(*center, *radius, *sides, *rotation)
            }
            _ => Vec::new(),
        }
    }

    /// Straight edges of line-like shapes: lines, rectangle edges and polyline segments.
    pub fn edges(&self) -> Vec<(Point, Point)> {
        match self {
            ShapeData::Line { start, end } => vec![(*start, *end)],
            ShapeData::Rectangle { corner1, corner2 } => {
                let c = rectangle_corners(*corner1, *corner2);
                (0..4).map(|i| (c[i], c[(i + 1) % 4])).collect()
            }
            ShapeData::Polyline { points, closed } => {
                let mut edges: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
                if *closed && points.len() > 2 {
                    edges.push((points[points.len() - 1], points[0]));
                }
                edges
            }
            _ => Vec::new(),
        }
    }

    /// Start and end points of open curves.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match self {
            ShapeData::Line { start, end } => Some((*start, *end)),
            ShapeData::Arc { center, radius, start_angle, end_angle } => Some((
                arc_point(*center, *radius, *start_angle),
                arc_point(*center, *radius, *end_angle),
            )),
            ShapeData::Polyline { points, .. } if points.len() >= 2 => {
                Some((points[0], points[points.len() - 1]))
            }
            ShapeData::Spline { control_points, .. } if control_points.len() >= 2 => {
                Some((control_points[0], control_points[control_points.len() - 1]))
            }
            _ => None,
        }
    }

    /// Geometric center of shapes that have one.
    pub fn center(&self) -> Option<Point> {
        match self {
            ShapeData::Circle { center, .. }
            | ShapeData::Arc { center, .. }
            | ShapeData::Ellipse { center, .. }
            | ShapeData::Polygon { center, .. } => Some(*center),
            ShapeData::Rectangle { corner1, corner2 } => Some(corner1.midpoint(*corner2)),
            _ => None,
        }
    }

    /// Radius of circles and arcs.
    pub fn radius(&self) -> Option<f64> {
        match self {
            ShapeData::Circle { radius, .. } | ShapeData::Arc { radius, .. } => Some(*radius),
            _ => None,
        }
    }

    /// A representative point: the center if there is one, otherwise a placement point.
    pub fn anchor_point(&self) -> Option<Point> {
        if let Some(c) = self.center() {
            return Some(c);
        }
        match self {
            ShapeData::Line { start, end } => Some(start.midpoint(*end)),
            ShapeData::Polyline { points, .. } => points.first().copied(),
            ShapeData::Spline { control_points, .. } => control_points.first().copied(),
            ShapeData::XLine { point, .. } | ShapeData::Ray { point, .. } => Some(*point),
            ShapeData::Text { position, .. } => Some(*position),
            ShapeData::Dimension { text_position, .. } => Some(*text_position),
            ShapeData::BlockRef { insertion_point, .. } => Some(*insertion_point),
            ShapeData::ArrayRef { source_objects, .. } => {
                source_objects.first().and_then(|o| o.data.anchor_point())
            }
            _ => None,
        }
    }

    /// Polyline approximation of the visible outline. Closed outlines repeat
    /// their first point at the end.
    pub fn outline_points(&self) -> Vec<Point> {
        match self {
            ShapeData::Line { start, end } => vec![*start, *end],
            ShapeData::Polyline { points, closed } => {
                if *closed {
                    closed_ring(points.clone())
                } else {
                    points.clone()
                }
            }
            ShapeData::Circle { center, radius } => {
                calculate_ellipse_points(*center, *radius, *radius, 0.0, DEFAULT_ELLIPSE_SEGMENTS)
            }
            ShapeData::Arc { center, radius, start_angle, end_angle } => {
                arc_samples(*center, *radius, *start_angle, *end_angle)
            }
            ShapeData::Rectangle { corner1, corner2 } => {
                closed_ring(rectangle_corners(*corner1, *corner2).to_vec())
            }
            ShapeData::Polygon { center, radius, sides, rotation } => {
                closed_ring(generate_polygon_points(*center, *radius, *sides, *rotation))
            }
            ShapeData::Spline { control_points, .. } => {
                calculate_spline_points(control_points, DEFAULT_SPLINE_SEGMENTS)
            }
            ShapeData::Ellipse { center, major_radius, minor_radius, rotation } => {
                calculate_ellipse_points(*center, *major_radius, *minor_radius, *rotation, DEFAULT_ELLIPSE_SEGMENTS)
            }
            ShapeData::Dimension { points, .. } => points.clone(),
            ShapeData::Text { .. } => self.text_box().map(|b| closed_ring(b.to_vec())).unwrap_or_default(),
            ShapeData::XLine { point, .. } | ShapeData::Ray { point, .. } => vec![*point],
            ShapeData::BlockRef { insertion_point, .. } => vec![*insertion_point],
            ShapeData::ArrayRef { .. } => Vec::new(),
        }
    }

    fn text_box(&self) -> Option<[Point; 4]> {
        let ShapeData::Text { position, content, height, rotation } = self else {
            return None;
        };
        let width = content.chars().count().max(1) as f64 * height * 0.6;
        let corners = [
            *position,
            Point::new(position.x + width, position.y),
            Point::new(position.x + width, position.y - height),
            Point::new(position.x, position.y - height),
        ];
        Some(corners.map(|c| geometry::rotate_point(c, *position, *rotation)))
    }

    /// Axis-aligned bounding box.
    ///
    /// Block references need their block definition and return `None`; use
    /// `CadDocument::object_bounds` for those.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            ShapeData::Circle { center, radius } => Some(Rect::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            )),
            ShapeData::Arc { center, radius, start_angle, end_angle } => {
                let mut pts = vec![
                    arc_point(*center, *radius, *start_angle),
                    arc_point(*center, *radius, *end_angle),
                ];
                for q in [0.0, FRAC_PI_2, PI, 1.5 * PI] {
                    if geometry::angle_in_arc_range(q, *start_angle, *end_angle) {
                        pts.push(arc_point(*center, *radius, q));
                    }
                }
                bounds_of(&pts)
            }
            ShapeData::Dimension { points, text_position, .. } => {
                let mut pts = points.clone();
                pts.push(*text_position);
                bounds_of(&pts)
            }
            ShapeData::BlockRef { .. } => None,
            ShapeData::ArrayRef { source_objects, params, .. } => {
                crate::array::generate_instances(source_objects, params)
                    .iter()
                    .filter_map(|o| o.data.bounds())
                    .reduce(|a, b| a.union(b))
            }
            _ => bounds_of(&self.outline_points()),
        }
    }

    /// Whether `point` lies within `tolerance` of the shape's outline.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            ShapeData::XLine { point: origin, direction } => {
                geometry::point_to_line_distance(point, *origin, *origin + *direction) <= tolerance
            }
            ShapeData::Ray { point: origin, direction } => {
                let len_sq = direction.hypot2();
                if len_sq < f64::EPSILON {
                    return origin.distance(point) <= tolerance;
                }
                let t = ((point - *origin).dot(*direction) / len_sq).max(0.0);
                (*origin + *direction * t).distance(point) <= tolerance
            }
            ShapeData::Text { .. } | ShapeData::BlockRef { .. } | ShapeData::ArrayRef { .. } => self
                .bounds()
                .map(|b| b.inflate(tolerance, tolerance))
                .is_some_and(|b| b.contains(point)),
            _ => {
                let outline = self.outline_points();
                match outline.len() {
                    0 => false,
                    1 => outline[0].distance(point) <= tolerance,
                    _ => outline
                        .windows(2)
                        .any(|w| point_to_segment_distance(point, w[0], w[1]) <= tolerance),
                }
            }
        }
    }

    /// Whether the outline crosses or lies inside `rect` (crossing selection).
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        match self {
            ShapeData::XLine { .. }
            | ShapeData::Ray { .. }
            | ShapeData::Text { .. }
            | ShapeData::BlockRef { .. }
            | ShapeData::ArrayRef { .. } => self
                .bounds()
                .is_some_and(|b| rect.intersect(b).area() > 0.0 || rect.contains(b.center())),
            _ => segments_touch_rect(&self.outline_points(), rect),
        }
    }

    /// Length of open linear shapes, circumference of circles and arcs'
    /// full circles. Used by the `Equal` constraint.
    pub fn measure(&self) -> Option<f64> {
        match self {
            ShapeData::Line { start, end } => Some(start.distance(*end)),
            ShapeData::Polyline { .. } => Some(geometry::path_length(&self.outline_points())),
            ShapeData::Circle { radius, .. } | ShapeData::Arc { radius, .. } => Some(TAU * radius),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_edges_and_vertices() {
        let rect = ShapeData::Rectangle {
            corner1: Point::new(0.0, 0.0),
            corner2: Point::new(4.0, 2.0),
        };
        assert_eq!(rect.kind(), ShapeKind::Rectangle);
        assert_eq!(rect.vertices().len(), 4);
        let edges = rect.edges();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[1], (Point::new(4.0, 0.0), Point::new(4.0, 2.0)));
        assert_eq!(rect.center(), Some(Point::new(2.0, 1.0)));
    }

    #[test]
    fn test_closed_polyline_edges() {
        let poly = ShapeData::Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)],
            closed: true,
        };
        assert_eq!(poly.edges().len(), 3);
        assert_eq!(poly.outline_points().len(), 4);
    }

    #[test]
    fn test_circle_bounds() {
        let circle = ShapeData::Circle { center: Point::new(1.0, 1.0), radius: 2.0 };
        assert_eq!(circle.bounds(), Some(Rect::new(-1.0, -1.0, 3.0, 3.0)));
    }

    #[test]
    fn test_arc_bounds_quarter() {
        let arc = ShapeData::Arc {
            center: Point::ZERO,
            radius: 1.0,
            start_angle: 0.0,
            end_angle: FRAC_PI_2,
        };
        let b = arc.bounds().unwrap();
        assert!((b.x0 - 0.0).abs() < 1e-9 && (b.y0 - 0.0).abs() < 1e-9);
        assert!((b.x1 - 1.0).abs() < 1e-9 && (b.y1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_line_and_circle() {
        let line = ShapeData::Line { start: Point::ZERO, end: Point::new(10.0, 0.0) };
        assert!(line.hit_test(Point::new(5.0, 0.5), 1.0));
        assert!(!line.hit_test(Point::new(5.0, 2.0), 1.0));

        let circle = ShapeData::Circle { center: Point::ZERO, radius: 5.0 };
        assert!(circle.hit_test(Point::new(0.0, 5.2), 0.5));
        assert!(!circle.hit_test(Point::ZERO, 0.5));
    }

    #[test]
    fn test_hit_test_ray_only_forward() {
        let ray = ShapeData::Ray { point: Point::ZERO, direction: Vec2::new(1.0, 0.0) };
        assert!(ray.hit_test(Point::new(100.0, 0.1), 0.5));
        assert!(!ray.hit_test(Point::new(-100.0, 0.1), 0.5));
    }

    #[test]
    fn test_intersects_rect_crossing_line() {
        let line = ShapeData::Line { start: Point::new(-5.0, 1.0), end: Point::new(5.0, 1.0) };
        assert!(line.intersects_rect(Rect::new(0.0, 0.0, 2.0, 2.0)));
        assert!(!line.intersects_rect(Rect::new(0.0, 2.0, 2.0, 4.0)));
    }

    #[test]
    fn test_arc_endpoints() {
        let arc = ShapeData::Arc { center: Point::ZERO, radius: 2.0, start_angle: 0.0, end_angle: PI };
        let (s, e) = arc.endpoints().unwrap();
        assert!(s.distance(Point::new(2.0, 0.0)) < 1e-9);
        assert!(e.distance(Point::new(-2.0, 0.0)) < 1e-9);
    }
}
