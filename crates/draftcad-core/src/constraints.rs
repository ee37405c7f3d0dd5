//! Geometric and dimensional constraints.
//!
//! Every constraint type can be checked. Only coincident, single-line
//! distance, radius and concentric have a corrective rewrite; the solver
//! leaves the others unsatisfied.

use crate::document::{CadDocument, Changeset, DocumentError};
use crate::geometry::{Transform, point_to_line_distance, unit};
use crate::shapes::{CadObject, ObjectId, ShapeData};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use uuid::Uuid;

pub type ConstraintId = Uuid;

/// Tolerance used by every constraint predicate.
pub const CONSTRAINT_TOLERANCE: f64 = 0.01;

/// Iteration budget of [`solve`].
pub const MAX_SOLVER_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    Coincident,
    Parallel,
    Perpendicular,
    Concentric,
    Equal,
    Tangent,
    Collinear,
    Symmetric,
    Distance,
    /// Degrees; between two lines, or a single line against the x axis.
    Angle,
    Radius,
    Diameter,
}

impl ConstraintType {
    /// How many objects the constraint relates.
    pub fn arity(self) -> RangeInclusive<usize> {
        match self {
            ConstraintType::Distance | ConstraintType::Angle => 1..=2,
            ConstraintType::Radius | ConstraintType::Diameter => 1..=1,
            _ => 2..=2,
        }
    }

    /// Whether the constraint compares against a stored value.
    pub fn is_dimensional(self) -> bool {
        matches!(
            self,
            ConstraintType::Distance | ConstraintType::Angle | ConstraintType::Radius | ConstraintType::Diameter
        )
    }

    /// Whether [`solve`] has a rewrite for this type.
    pub fn is_solvable(self) -> bool {
        matches!(
            self,
            ConstraintType::Coincident
                | ConstraintType::Distance
                | ConstraintType::Radius
                | ConstraintType::Concentric
        )
    }
}

/// A stored relationship between one or two objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDef {
    pub id: ConstraintId,
    pub constraint_type: ConstraintType,
    pub object_ids: Vec<ObjectId>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub reference_point: Option<Point>,
    /// Result of the last check. Recompute before relying on it.
    #[serde(default)]
    pub satisfied: bool,
}

impl ConstraintDef {
    pub fn new(constraint_type: ConstraintType, object_ids: Vec<ObjectId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            constraint_type,
            object_ids,
            value: None,
            reference_point: None,
            satisfied: false,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_reference_point(mut self, point: Point) -> Self {
        self.reference_point = Some(point);
        self
    }
}

/// Outcome of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolveReport {
    pub iterations: usize,
    pub satisfied: usize,
    pub unsatisfied: usize,
}

impl SolveReport {
    pub fn all_satisfied(&self) -> bool {
        self.unsatisfied == 0
    }
}

fn line_of(data: &ShapeData) -> Option<(Point, Point)> {
    match data {
        ShapeData::Line { start, end } => Some((*start, *end)),
        _ => None,
    }
}

fn direction(data: &ShapeData) -> Option<Vec2> {
    let (a, b) = line_of(data)?;
    unit(b - a)
}

fn circular(data: &ShapeData) -> Option<(Point, f64)> {
    match data {
        ShapeData::Circle { center, radius } | ShapeData::Arc { center, radius, .. } => Some((*center, *radius)),
        _ => None,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < CONSTRAINT_TOLERANCE
}

/// Unsigned angle between two line directions, in degrees within [0, 180].
fn angle_between_deg(a: Vec2, b: Vec2) -> f64 {
    a.cross(b).atan2(a.dot(b)).abs().to_degrees()
}

fn tangent(line: &ShapeData, circle: &ShapeData) -> Option<bool> {
    let (start, end) = line_of(line)?;
    let (center, radius) = circular(circle)?;
    let nearest = center.distance(start).min(center.distance(end));
    Some(close(nearest, radius))
}

/// Evaluate a constraint against the objects it references. Missing objects,
/// wrong shape kinds and a missing stored value all count as unsatisfied.
pub fn check(constraint: &ConstraintDef, objects: &HashMap<ObjectId, CadObject>) -> bool {
    let shapes: Option<Vec<&ShapeData>> = constraint
        .object_ids
        .iter()
        .map(|id| objects.get(id).map(|o| &o.data))
        .collect();
    let Some(shapes) = shapes else {
        return false;
    };
    if !constraint.constraint_type.arity().contains(&shapes.len()) {
        return false;
    }
    evaluate(constraint, &shapes).unwrap_or(false)
}

fn evaluate(constraint: &ConstraintDef, shapes: &[&ShapeData]) -> Option<bool> {
    let first = shapes[0];
    let second = shapes.get(1).copied();
    let value = constraint.value;

    let ok = match constraint.constraint_type {
        ConstraintType::Coincident => {
            let (_, end) = first.endpoints()?;
            let (start, _) = second?.endpoints()?;
            end.distance(start) < CONSTRAINT_TOLERANCE
        }
        ConstraintType::Parallel => direction(first)?.cross(direction(second?)?).abs() < CONSTRAINT_TOLERANCE,
        ConstraintType::Perpendicular => direction(first)?.dot(direction(second?)?).abs() < CONSTRAINT_TOLERANCE,
        ConstraintType::Concentric => first.center()?.distance(second?.center()?) < CONSTRAINT_TOLERANCE,
        ConstraintType::Equal => close(first.measure()?, second?.measure()?),
        ConstraintType::Tangent => {
            let second = second?;
            tangent(first, second).or_else(|| tangent(second, first))?
        }
        ConstraintType::Collinear => {
            let (a, b) = line_of(first)?;
            let (c, d) = line_of(second?)?;
            point_to_line_distance(c, a, b) < CONSTRAINT_TOLERANCE
                && point_to_line_distance(d, a, b) < CONSTRAINT_TOLERANCE
        }
        ConstraintType::Symmetric => {
            let mid = first.anchor_point()?.midpoint(second?.anchor_point()?);
            mid.distance(constraint.reference_point?) < CONSTRAINT_TOLERANCE
        }
        ConstraintType::Distance => {
            let actual = match second {
                Some(other) => first.anchor_point()?.distance(other.anchor_point()?),
                None => {
                    let (a, b) = line_of(first)?;
                    a.distance(b)
                }
            };
            close(actual, value?)
        }
        ConstraintType::Angle => {
            let actual = match second {
                Some(other) => angle_between_deg(direction(first)?, direction(other)?),
                None => {
                    let d = direction(first)?;
                    d.y.atan2(d.x).to_degrees().rem_euclid(360.0)
                }
            };
            close(actual, value?)
        }
        ConstraintType::Radius => close(circular(first)?.1, value?),
        ConstraintType::Diameter => close(circular(first)?.1 * 2.0, value?),
    };
    Some(ok)
}

/// Apply the corrective rewrite for one unsatisfied constraint. Returns
/// whether anything moved.
fn correct(constraint: &ConstraintDef, objects: &mut HashMap<ObjectId, CadObject>) -> bool {
    let ids = &constraint.object_ids;
    let Some(first) = ids.first().and_then(|id| objects.get(id)) else {
        return false;
    };

    match (constraint.constraint_type, ids.get(1)) {
        (ConstraintType::Coincident, Some(second_id)) => {
            let Some((_, target)) = first.data.endpoints() else {
                return false;
            };
            translate_onto(objects, *second_id, target, |d| d.endpoints().map(|(s, _)| s))
        }
        (ConstraintType::Concentric, Some(second_id)) => {
            let Some(target) = first.data.center() else {
                return false;
            };
            translate_onto(objects, *second_id, target, ShapeData::center)
        }
        (ConstraintType::Distance, None) => {
            let (Some(value), ShapeData::Line { start, end }) = (constraint.value, &first.data) else {
                return false;
            };
            let Some(dir) = unit(*end - *start).filter(|_| value > 0.0) else {
                return false;
            };
            let data = ShapeData::Line { start: *start, end: *start + dir * value };
            set_data(objects, ids[0], data)
        }
        (ConstraintType::Radius, None) => {
            let Some(value) = constraint.value.filter(|v| *v > 0.0) else {
                return false;
            };
            let data = match first.data.clone() {
                ShapeData::Circle { center, .. } => ShapeData::Circle { center, radius: value },
                ShapeData::Arc { center, start_angle, end_angle, .. } => ShapeData::Arc {
                    center,
                    radius: value,
                    start_angle,
                    end_angle,
                },
                _ => return false,
            };
            set_data(objects, ids[0], data)
        }
        _ => false,
    }
}

fn translate_onto(
    objects: &mut HashMap<ObjectId, CadObject>,
    id: ObjectId,
    target: Point,
    reference: impl Fn(&ShapeData) -> Option<Point>,
) -> bool {
    let Some(object) = objects.get_mut(&id) else {
        return false;
    };
    let Some(from) = reference(&object.data) else {
        return false;
    };
    object.data = Transform::Translate(target - from).apply(&object.data);
    true
}

fn set_data(objects: &mut HashMap<ObjectId, CadObject>, id: ObjectId, data: ShapeData) -> bool {
    match objects.get_mut(&id) {
        Some(object) => {
            object.data = data;
            true
        }
        None => false,
    }
}

/// Best-effort enforcement by direct rewrites.
///
/// Each pass re-checks every constraint in order and corrects the unsatisfied
/// ones that have a rule. Stops after a pass with nothing unsatisfied or after
/// [`MAX_SOLVER_ITERATIONS`] passes. Cached `satisfied` flags are refreshed.
pub fn solve(objects: &mut HashMap<ObjectId, CadObject>, constraints: &mut [ConstraintDef]) -> SolveReport {
    let mut iterations = 0;
    for _ in 0..MAX_SOLVER_ITERATIONS {
        iterations += 1;
        let mut all_satisfied = true;
        for constraint in constraints.iter_mut() {
            constraint.satisfied = check(constraint, objects);
            if !constraint.satisfied {
                all_satisfied = false;
                if constraint.constraint_type.is_solvable() {
                    correct(constraint, objects);
                }
            }
        }
        if all_satisfied {
            break;
        }
    }

    let mut report = SolveReport { iterations, ..Default::default() };
    for constraint in constraints.iter_mut() {
        constraint.satisfied = check(constraint, objects);
        if constraint.satisfied {
            report.satisfied += 1;
        } else {
            report.unsatisfied += 1;
        }
    }
    log::debug!(
        "Constraint solve: {} passes, {} satisfied, {} unsatisfied",
        report.iterations,
        report.satisfied,
        report.unsatisfied
    );
    report
}

impl CadDocument {
    pub fn constraints(&self) -> &[ConstraintDef] {
        &self.constraints
    }

    /// Store a constraint after validating its references. Its `satisfied`
    /// flag is computed immediately.
    pub fn add_constraint(&mut self, mut constraint: ConstraintDef) -> Result<ConstraintId, DocumentError> {
        let kind = constraint.constraint_type;
        if !kind.arity().contains(&constraint.object_ids.len()) {
            return Err(DocumentError::InvalidConstraint(kind, constraint.object_ids.len()));
        }
        if kind.is_dimensional() && constraint.value.is_none() {
            return Err(DocumentError::MissingConstraintValue(kind));
        }
        if let Some(missing) = constraint.object_ids.iter().find(|id| !self.objects.contains_key(id)) {
            return Err(DocumentError::ObjectNotFound(*missing));
        }
        constraint.satisfied = check(&constraint, &self.objects);
        let id = constraint.id;
        self.constraints.push(constraint);
        Ok(id)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Option<ConstraintDef> {
        let index = self.constraints.iter().position(|c| c.id == id)?;
        Some(self.constraints.remove(index))
    }

    /// Refresh every cached `satisfied` flag. Returns the number unsatisfied.
    pub fn check_constraints(&mut self) -> usize {
        let objects = &self.objects;
        let mut unsatisfied = 0;
        for constraint in &mut self.constraints {
            constraint.satisfied = check(constraint, objects);
            if !constraint.satisfied {
                if constraint.object_ids.iter().any(|id| !objects.contains_key(id)) {
                    log::warn!("Constraint {} references a deleted object", constraint.id);
                }
                unsatisfied += 1;
            }
        }
        unsatisfied
    }

    /// Run the solver and commit the rewritten objects as one undoable step.
    pub fn solve_constraints(&mut self) -> SolveReport {
        let mut working: HashMap<ObjectId, CadObject> = self
            .constraints
            .iter()
            .flat_map(|c| c.object_ids.iter())
            .filter_map(|id| self.objects.get(id))
            .map(|o| (o.id, o.clone()))
            .collect();
        let report = solve(&mut working, &mut self.constraints);

        let mut changes = Changeset::default();
        for (id, object) in working {
            if self.objects.get(&id).is_some_and(|current| current.data != object.data) {
                changes.update(object);
            }
        }
        self.apply(changes);
        report
    }
}
