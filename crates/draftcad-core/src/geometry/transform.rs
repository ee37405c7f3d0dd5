//! Rigid and similarity transforms over whole shapes.

use super::{angle, mirror_point, rotate_point, rotate_vector, scale_point, unit};
use crate::array::ArrayParams;
use crate::shapes::{CadObject, ShapeData};
use kurbo::{Point, Vec2};
use std::f64::consts::{FRAC_PI_2, PI};

/// A transform that can be applied to any [`ShapeData`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Translate(Vec2),
    Rotate { center: Point, angle: f64 },
    /// Uniform scale. Negative factors flip through `center`.
    Scale { center: Point, factor: f64 },
    /// Reflection across the infinite line through `start` and `end`.
    Mirror { start: Point, end: Point },
}

impl Transform {
    pub fn apply_point(&self, p: Point) -> Point {
        match *self {
            Transform::Translate(delta) => p + delta,
            Transform::Rotate { center, angle } => rotate_point(p, center, angle),
            Transform::Scale { center, factor } => scale_point(p, center, factor),
            Transform::Mirror { start, end } => mirror_point(p, start, end),
        }
    }

    /// Linear part of the transform, for directions and displacements.
    pub fn apply_vector(&self, v: Vec2) -> Vec2 {
        match *self {
            Transform::Translate(_) => v,
            Transform::Rotate { angle, .. } => rotate_vector(v, angle),
            Transform::Scale { factor, .. } => v * factor,
            Transform::Mirror { start, end } => match unit(end - start) {
                Some(u) => u * (2.0 * v.dot(u)) - v,
                None => v,
            },
        }
    }

    /// Map an orientation angle. Mirroring reflects it about the mirror line.
    pub fn apply_angle(&self, a: f64) -> f64 {
        match *self {
            Transform::Translate(_) => a,
            Transform::Rotate { angle, .. } => a + angle,
            Transform::Scale { factor, .. } => {
                if factor < 0.0 {
                    a + PI
                } else {
                    a
                }
            }
            Transform::Mirror { start, end } => {
                if start.distance(end) < f64::EPSILON {
                    a
                } else {
                    2.0 * angle(start, end) - a
                }
            }
        }
    }

    pub fn apply_length(&self, length: f64) -> f64 {
        match *self {
            Transform::Scale { factor, .. } => length * factor.abs(),
            _ => length,
        }
    }

    fn is_reflection(&self) -> bool {
        matches!(self, Transform::Mirror { start, end } if start.distance(*end) >= f64::EPSILON)
    }

    /// Transform every point-bearing field of `data`.
    pub fn apply(&self, data: &ShapeData) -> ShapeData {
        let pt = |p: &Point| self.apply_point(*p);
        match data {
            ShapeData::Line { start, end } => ShapeData::Line { start: pt(start), end: pt(end) },
            ShapeData::Polyline { points, closed } => ShapeData::Polyline {
                points: points.iter().map(pt).collect(),
                closed: *closed,
            },
            ShapeData::Circle { center, radius } => ShapeData::Circle {
                center: pt(center),
                radius: self.apply_length(*radius),
            },
            ShapeData::Arc { center, radius, start_angle, end_angle } => {
                let (start_angle, end_angle) = if self.is_reflection() {
                    // Reflection reverses orientation; swap to stay counter-clockwise.
                    (self.apply_angle(*end_angle), self.apply_angle(*start_angle))
                } else {
                    (self.apply_angle(*start_angle), self.apply_angle(*end_angle))
                };
                ShapeData::Arc {
                    center: pt(center),
                    radius: self.apply_length(*radius),
                    start_angle,
                    end_angle,
                }
            }
            ShapeData::Rectangle { corner1, corner2 } => ShapeData::Rectangle {
                corner1: pt(corner1),
                corner2: pt(corner2),
            },
            ShapeData::Polygon { center, radius, sides, rotation } => {
                // The first vertex sits at `rotation - π/2`; map that direction.
                let first_vertex = self.apply_angle(*rotation - FRAC_PI_2);
                ShapeData::Polygon {
                    center: pt(center),
                    radius: self.apply_length(*radius),
                    sides: *sides,
                    rotation: first_vertex + FRAC_PI_2,
                }
            }
            ShapeData::Spline { control_points, degree } => ShapeData::Spline {
                control_points: control_points.iter().map(pt).collect(),
                degree: *degree,
            },
            ShapeData::Ellipse { center, major_radius, minor_radius, rotation } => ShapeData::Ellipse {
                center: pt(center),
                major_radius: self.apply_length(*major_radius),
                minor_radius: self.apply_length(*minor_radius),
                rotation: self.apply_angle(*rotation),
            },
            ShapeData::XLine { point, direction } => ShapeData::XLine {
                point: pt(point),
                direction: self.apply_vector(*direction),
            },
            ShapeData::Ray { point, direction } => ShapeData::Ray {
                point: pt(point),
                direction: self.apply_vector(*direction),
            },
            ShapeData::Text { position, content, height, rotation } => ShapeData::Text {
                position: pt(position),
                content: content.clone(),
                height: self.apply_length(*height),
                rotation: self.apply_angle(*rotation),
            },
            ShapeData::Dimension { kind, points, text_position } => ShapeData::Dimension {
                kind: *kind,
                points: points.iter().map(pt).collect(),
                text_position: pt(text_position),
            },
            ShapeData::BlockRef { block_id, insertion_point, scale, rotation, attributes } => {
                ShapeData::BlockRef {
                    block_id: *block_id,
                    insertion_point: pt(insertion_point),
                    scale: self.apply_length(*scale),
                    rotation: self.apply_angle(*rotation),
                    attributes: attributes.clone(),
                }
            }
            ShapeData::ArrayRef { source_objects, associative, params } => ShapeData::ArrayRef {
                source_objects: source_objects.iter().map(|o| self.apply_object(o)).collect(),
                associative: *associative,
                params: self.apply_params(params),
            },
        }
    }

    /// Same object (same id) with transformed geometry.
    pub fn apply_object(&self, object: &CadObject) -> CadObject {
        CadObject {
            data: self.apply(&object.data),
            ..object.clone()
        }
    }

    fn apply_params(&self, params: &ArrayParams) -> ArrayParams {
        match params {
            ArrayParams::Rectangular {
                rows,
                columns,
                row_spacing,
                column_spacing,
                incremental_rotation_deg,
                axis_angle,
                mirrored,
            } => {
                let factor = match *self {
                    Transform::Scale { factor, .. } => factor,
                    _ => 1.0,
                };
                let reflect = self.is_reflection();
                ArrayParams::Rectangular {
                    rows: *rows,
                    columns: *columns,
                    row_spacing: row_spacing * factor,
                    column_spacing: column_spacing * factor,
                    incremental_rotation_deg: if reflect {
                        -incremental_rotation_deg
                    } else {
                        *incremental_rotation_deg
                    },
                    // A negative scale is carried by the spacings.
                    axis_angle: match *self {
                        Transform::Scale { .. } => *axis_angle,
                        _ => self.apply_angle(*axis_angle),
                    },
                    mirrored: *mirrored ^ reflect,
                }
            }
            ArrayParams::Polar { center, item_count, fill_angle_deg, clockwise } => ArrayParams::Polar {
                center: self.apply_point(*center),
                item_count: *item_count,
                fill_angle_deg: *fill_angle_deg,
                clockwise: *clockwise ^ self.is_reflection(),
            },
            // Path points act as displacements of the sources, so only the
            // linear part applies.
            ArrayParams::Path { path_points, item_count, tangent_align } => ArrayParams::Path {
                path_points: path_points
                    .iter()
                    .map(|p| self.apply_vector(p.to_vec2()).to_point())
                    .collect(),
                item_count: *item_count,
                tangent_align: *tangent_align,
            },
        }
    }
}

/// Translate a shape by `delta`.
pub fn offset_object_data(data: &ShapeData, delta: Vec2) -> ShapeData {
    Transform::Translate(delta).apply(data)
}

/// Rotate a shape about `center` by `angle` radians.
pub fn rotate_object_data(data: &ShapeData, center: Point, angle: f64) -> ShapeData {
    Transform::Rotate { center, angle }.apply(data)
}

/// Scale a shape about `center`.
pub fn scale_object_data(data: &ShapeData, center: Point, factor: f64) -> ShapeData {
    Transform::Scale { center, factor }.apply(data)
}

/// Reflect a shape across the line through `line_start` and `line_end`.
pub fn mirror_object_data(data: &ShapeData, line_start: Point, line_end: Point) -> ShapeData {
    Transform::Mirror { start: line_start, end: line_end }.apply(data)
}
