//! Rectangular, polar and path arrays.
//!
//! An array is either baked into independent copies or stored as a single
//! associative `ArrayRef` object whose instances are regenerated on read.

use crate::document::{CadDocument, Changeset};
use crate::geometry::{Transform, point_on_path, rotate_vector};
use crate::shapes::{CadObject, ObjectId, ShapeData};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Parameters of an array. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "array_type")]
pub enum ArrayParams {
    Rectangular {
        rows: u32,
        columns: u32,
        row_spacing: f64,
        column_spacing: f64,
        #[serde(default)]
        incremental_rotation_deg: f64,
        /// Direction of the column axis, radians from +x.
        #[serde(default)]
        axis_angle: f64,
        /// Rows run clockwise from the column axis instead of counter-clockwise.
        #[serde(default)]
        mirrored: bool,
    },
    Polar {
        center: Point,
        item_count: u32,
        fill_angle_deg: f64,
        #[serde(default)]
        clockwise: bool,
    },
    Path {
        path_points: Vec<Point>,
        item_count: u32,
        #[serde(default)]
        tangent_align: bool,
    },
}

impl ArrayParams {
    /// Number of copies generated besides the original.
    pub fn instance_count(&self) -> usize {
        match self {
            ArrayParams::Rectangular { rows, columns, .. } => {
                (*rows as usize * *columns as usize).saturating_sub(1)
            }
            ArrayParams::Polar { item_count, .. } | ArrayParams::Path { item_count, .. } => {
                (*item_count as usize).saturating_sub(1)
            }
        }
    }

    /// Transform chains for every instance, excluding the original.
    pub fn instance_transforms(&self) -> Vec<Vec<Transform>> {
        match self {
            ArrayParams::Rectangular {
                rows,
                columns,
                row_spacing,
                column_spacing,
                incremental_rotation_deg,
                axis_angle,
                mirrored,
            } => {
                let column_axis = Vec2::from_angle(*axis_angle);
                let row_axis = rotate_vector(column_axis, if *mirrored { -FRAC_PI_2 } else { FRAC_PI_2 });
                let mut out = Vec::with_capacity(self.instance_count());
                for r in 0..*rows {
                    for c in 0..*columns {
                        if r == 0 && c == 0 {
                            continue;
                        }
                        let offset =
                            column_axis * (c as f64 * column_spacing) + row_axis * (r as f64 * row_spacing);
                        let mut chain = vec![Transform::Translate(offset)];
                        let step = (r * columns + c) as f64 * incremental_rotation_deg;
                        if step != 0.0 {
                            chain.push(Transform::Rotate {
                                center: offset.to_point(),
                                angle: step.to_radians(),
                            });
                        }
                        out.push(chain);
                    }
                }
                out
            }
            ArrayParams::Polar { center, item_count, fill_angle_deg, clockwise } => {
                if *item_count == 0 {
                    return Vec::new();
                }
                let step = (fill_angle_deg / *item_count as f64).to_radians();
                let sign = if *clockwise { -1.0 } else { 1.0 };
                (1..*item_count)
                    .map(|i| {
                        vec![Transform::Rotate {
                            center: *center,
                            angle: i as f64 * step * sign,
                        }]
                    })
                    .collect()
            }
            ArrayParams::Path { path_points, item_count, tangent_align } => {
                if *item_count < 2 || path_points.is_empty() {
                    return Vec::new();
                }
                let last = (*item_count - 1) as f64;
                (1..*item_count)
                    .filter_map(|i| point_on_path(path_points, i as f64 / last))
                    .map(|sample| {
                        // Absolute path coordinates act as the displacement.
                        let mut chain = vec![Transform::Translate(sample.point.to_vec2())];
                        if *tangent_align {
                            chain.push(Transform::Rotate {
                                center: sample.point,
                                angle: sample.angle,
                            });
                        }
                        chain
                    })
                    .collect()
            }
        }
    }
}

fn apply_chain(chain: &[Transform], data: &ShapeData) -> ShapeData {
    chain.iter().fold(data.clone(), |acc, t| t.apply(&acc))
}

/// Instances of `sources` produced by `params`, as fresh objects. The
/// originals are not part of the result.
pub fn generate_instances(sources: &[CadObject], params: &ArrayParams) -> Vec<CadObject> {
    params
        .instance_transforms()
        .iter()
        .flat_map(|chain| sources.iter().map(move |src| src.derive(apply_chain(chain, &src.data))))
        .collect()
}

/// Array the given objects.
///
/// Associative arrays add one `ArrayRef` holding snapshot copies of the
/// sources and expanding to the copies only; exploded arrays add every copy
/// as an ordinary object. The originals stay where they are in both modes.
/// Returns `None` when no source exists or the parameters produce no copies.
pub fn create_array(
    doc: &CadDocument,
    source_ids: &[ObjectId],
    params: ArrayParams,
    associative: bool,
) -> Option<Changeset> {
    let sources: Vec<CadObject> = source_ids
        .iter()
        .filter_map(|id| doc.get_object(*id))
        .map(|o| CadObject { selected: false, ..o.clone() })
        .collect();
    let template = sources.first()?.clone();
    if params.instance_count() == 0 {
        log::debug!("array parameters produce no instances");
        return None;
    }

    let mut changes = Changeset::default();
    if associative {
        let snapshot: Vec<CadObject> = sources.iter().map(CadObject::duplicate).collect();
        let array = template
            .derive(ShapeData::ArrayRef {
                source_objects: snapshot,
                associative: true,
                params,
            })
            .with_name("Array");
        changes.add(array);
    } else {
        for instance in generate_instances(&sources, &params) {
            changes.add(instance);
        }
    }
    Some(changes)
}

/// Replace the parameters of an associative array; every instance follows.
pub fn update_array_params(doc: &CadDocument, array_id: ObjectId, params: ArrayParams) -> Option<Changeset> {
    let object = doc.get_object(array_id)?;
    let ShapeData::ArrayRef { source_objects, associative, .. } = &object.data else {
        return None;
    };
    let mut updated = object.clone();
    updated.data = ShapeData::ArrayRef {
        source_objects: source_objects.clone(),
        associative: *associative,
        params,
    };
    let mut changes = Changeset::default();
    changes.update(updated);
    Some(changes)
}

/// Instances of an associative array as ordinary objects. They inherit the
/// array object's layer and selection state. Non-array objects yield nothing.
pub fn expand_array(object: &CadObject) -> Vec<CadObject> {
    let ShapeData::ArrayRef { source_objects, params, .. } = &object.data else {
        return Vec::new();
    };
    generate_instances(source_objects, params)
        .into_iter()
        .map(|mut instance| {
            instance.layer_id = object.layer_id;
            instance.selected = object.selected;
            instance
        })
        .collect()
}
