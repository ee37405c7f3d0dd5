//! Drawing and modify tools driven by pointer events.
//!
//! A [`Session`] holds the active tool and an explicit [`SessionState`].
//! Every pointer event resolves a point (see [`resolve_point`]), advances
//! the state and, once a tool has all its input, commits to the document.

mod resolve;

pub use resolve::{DEFAULT_ANGLE_STEP, ResolvedPoint, resolve_point};

use crate::document::{CadDocument, Changeset};
use crate::geometry::{Transform, angle, distance, midpoint, point_to_line_distance};
use crate::input::{Modifiers, PointerEvent};
use crate::shapes::{CadObject, DimensionKind, ObjectId, ShapeData};
use crate::snap::SnapResult;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Drags and modify gestures shorter than this are discarded.
pub const MIN_COMMIT_DISTANCE: f64 = 1.0;

/// Default divisor for the scale tool's factor.
pub const DEFAULT_SCALE_REFERENCE: f64 = 100.0;

/// Degree of splines drawn with the spline tool.
const SPLINE_DEGREE: u32 = 3;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Line,
    Rectangle,
    Circle,
    Arc,
    Polyline,
    Spline,
    Ellipse,
    Dimension,
    Move,
    Copy,
    Rotate,
    Scale,
    Mirror,
}

impl ToolKind {
    /// Press, drag and release tools.
    pub fn is_drag(self) -> bool {
        matches!(self, ToolKind::Line | ToolKind::Rectangle | ToolKind::Circle)
    }

    /// Tools that transform the selection.
    pub fn is_modify(self) -> bool {
        matches!(
            self,
            ToolKind::Move | ToolKind::Copy | ToolKind::Rotate | ToolKind::Scale | ToolKind::Mirror
        )
    }

    /// Tools collecting an open-ended point list until finished.
    pub fn is_open_ended(self) -> bool {
        matches!(self, ToolKind::Polyline | ToolKind::Spline)
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Waiting for the first point.
    #[default]
    Idle,
    /// Points collected so far for `tool`.
    Collecting {
        tool: ToolKind,
        /// Number of points fixed by clicks or presses.
        step: usize,
        points: Vec<Point>,
        /// Objects being modified, captured when a modify tool starts.
        targets: Vec<ObjectId>,
        /// Shapes a renderer draws for feedback.
        preview: Vec<ShapeData>,
    },
}

/// Result of feeding one event to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing was committed.
    Pending,
    /// These objects were created or modified.
    Committed(Vec<ObjectId>),
    /// The gesture ended without producing anything.
    Discarded,
    /// The select tool changed the selection.
    SelectionChanged,
}

/// Manages the current tool and its state.
#[derive(Debug, Clone)]
pub struct Session {
    tool: ToolKind,
    state: SessionState,
    /// Distance from the base point that maps to a factor of 1 with the scale tool.
    pub scale_reference: f64,
    last_snap: Option<SnapResult>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            tool: ToolKind::default(),
            state: SessionState::Idle,
            scale_reference: DEFAULT_SCALE_REFERENCE,
            last_snap: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools, discarding any interaction in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
        self.cancel();
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Collecting { .. })
    }

    /// Snap that produced the most recent resolved point.
    pub fn last_snap(&self) -> Option<&SnapResult> {
        self.last_snap.as_ref()
    }

    /// Preview shapes for the interaction in progress.
    pub fn preview(&self) -> &[ShapeData] {
        match &self.state {
            SessionState::Idle => &[],
            SessionState::Collecting { preview, .. } => preview,
        }
    }

    /// Discard the interaction in progress without committing.
    pub fn cancel(&mut self) {
        self.state = SessionState::Idle;
        self.last_snap = None;
    }

    /// Feed one pointer event.
    pub fn handle_event(&mut self, doc: &mut CadDocument, event: PointerEvent) -> Outcome {
        if self.tool == ToolKind::Select {
            return self.handle_select(doc, event);
        }

        let anchor = match &self.state {
            SessionState::Collecting { points, .. } => points.last().copied(),
            SessionState::Idle => None,
        };
        let resolved = resolve_point(doc, event.position(), anchor, event.modifiers());
        self.last_snap = resolved.snap.clone();
        let point = resolved.point;

        match event {
            PointerEvent::Down { .. } => self.press(doc, point),
            PointerEvent::Move { .. } => {
                self.update_preview(doc, point);
                Outcome::Pending
            }
            PointerEvent::Up { .. } => self.release(doc, point),
        }
    }

    fn press(&mut self, doc: &mut CadDocument, point: Point) -> Outcome {
        let tool = self.tool;
        match &mut self.state {
            SessionState::Idle => {
                let targets = if tool.is_modify() {
                    let targets: Vec<ObjectId> = doc
                        .selected_objects()
                        .filter(|o| doc.is_editable(o))
                        .map(|o| o.id)
                        .collect();
                    if targets.is_empty() {
                        log::debug!("{:?} needs a selection", tool);
                        return Outcome::Discarded;
                    }
                    targets
                } else {
                    Vec::new()
                };
                self.state = SessionState::Collecting {
                    tool,
                    step: 1,
                    points: vec![point],
                    targets,
                    preview: Vec::new(),
                };
                Outcome::Pending
            }
            SessionState::Collecting { step, points, .. } => {
                if tool.is_drag() || tool.is_modify() {
                    return Outcome::Pending;
                }
                if tool == ToolKind::Polyline
                    && points.len() >= 3
                    && distance(point, points[0]) < MIN_COMMIT_DISTANCE
                {
                    let closed = points.clone();
                    return self.commit_shape(doc, polyline_shape(closed, true));
                }
                points.push(point);
                *step += 1;

                let points = points.clone();
                match (tool, points.len()) {
                    (ToolKind::Arc, 3) => self.commit_shape(doc, arc_shape(&points)),
                    (ToolKind::Dimension, 3) => self.commit_shape(doc, dimension_shape(&points)),
                    (ToolKind::Ellipse, 3) => self.commit_shape(doc, ellipse_shape(&points)),
                    _ => Outcome::Pending,
                }
            }
        }
    }

    fn update_preview(&mut self, doc: &CadDocument, point: Point) {
        let tool = self.tool;
        let scale_reference = self.scale_reference;
        let SessionState::Collecting { points, targets, preview, .. } = &mut self.state else {
            return;
        };
        let mut candidate = points.clone();
        candidate.push(point);

        *preview = if tool.is_modify() {
            match modify_transform(tool, candidate[0], point, scale_reference) {
                Some(transform) => targets
                    .iter()
                    .filter_map(|id| doc.get_object(*id))
                    .map(|o| transform.apply(&o.data))
                    .collect(),
                None => Vec::new(),
            }
        } else {
            preview_shape(tool, &candidate).into_iter().collect()
        };
    }

    fn release(&mut self, doc: &mut CadDocument, point: Point) -> Outcome {
        let tool = self.tool;
        if !(tool.is_drag() || tool.is_modify()) {
            return Outcome::Pending;
        }
        let SessionState::Collecting { points, targets, .. } = std::mem::take(&mut self.state) else {
            return Outcome::Pending;
        };
        let start = points[0];
        if distance(start, point) <= MIN_COMMIT_DISTANCE {
            log::debug!("{:?} gesture below threshold, discarded", tool);
            return Outcome::Discarded;
        }

        if tool.is_drag() {
            return match drag_shape(tool, start, point) {
                Some(shape) => self.commit_shape(doc, Some(shape)),
                None => Outcome::Discarded,
            };
        }
        let Some(transform) = modify_transform(tool, start, point, self.scale_reference) else {
            return Outcome::Discarded;
        };
        apply_modify(doc, tool, &targets, &transform)
    }

    /// Finish an open-ended polyline or spline.
    pub fn finish(&mut self, doc: &mut CadDocument, closed: bool) -> Outcome {
        let tool = self.tool;
        if !tool.is_open_ended() {
            return Outcome::Pending;
        }
        let SessionState::Collecting { points, .. } = &self.state else {
            return Outcome::Pending;
        };
        let points = points.clone();
        let shape = match tool {
            ToolKind::Polyline => polyline_shape(points, closed),
            _ if points.len() >= 2 => Some(ShapeData::Spline { control_points: points, degree: SPLINE_DEGREE }),
            _ => None,
        };
        self.commit_shape(doc, shape)
    }

    fn commit_shape(&mut self, doc: &mut CadDocument, shape: Option<ShapeData>) -> Outcome {
        self.state = SessionState::Idle;
        let Some(shape) = shape else {
            log::debug!("{:?} produced a degenerate shape, discarded", self.tool);
            return Outcome::Discarded;
        };
        let object = CadObject::new(doc.current_layer_id(), shape);
        let id = doc.add_object(object);
        log::debug!("Committed {:?} {}", self.tool, id);
        Outcome::Committed(vec![id])
    }

    fn handle_select(&mut self, doc: &mut CadDocument, event: PointerEvent) -> Outcome {
        let point = event.position();
        match event {
            PointerEvent::Down { modifiers, .. } => {
                let tolerance = doc.snap.aperture / doc.view.zoom.max(f64::EPSILON);
                if let Some(id) = doc.topmost_at(point, tolerance) {
                    if modifiers.shift {
                        doc.toggle_selection(id);
                    } else if !doc.is_selected(id) {
                        doc.select(id);
                    }
                    return Outcome::SelectionChanged;
                }
                self.state = SessionState::Collecting {
                    tool: ToolKind::Select,
                    step: 1,
                    points: vec![point],
                    targets: Vec::new(),
                    preview: Vec::new(),
                };
                Outcome::Pending
            }
            PointerEvent::Move { .. } => {
                if let SessionState::Collecting { points, preview, .. } = &mut self.state {
                    *preview = vec![ShapeData::Rectangle { corner1: points[0], corner2: point }];
                }
                Outcome::Pending
            }
            PointerEvent::Up { modifiers, .. } => {
                let SessionState::Collecting { points, .. } = std::mem::take(&mut self.state) else {
                    return Outcome::Pending;
                };
                let start = points[0];
                let ids = if distance(start, point) > MIN_COMMIT_DISTANCE {
                    // Dragging right to left selects by crossing.
                    let crossing = point.x < start.x;
                    doc.objects_in_window(Rect::from_points(start, point), crossing)
                } else {
                    Vec::new()
                };
                select_ids(doc, ids, modifiers);
                Outcome::SelectionChanged
            }
        }
    }
}

fn select_ids(doc: &mut CadDocument, ids: Vec<ObjectId>, modifiers: Modifiers) {
    let ids: Vec<ObjectId> = ids
        .into_iter()
        .filter(|id| doc.get_object(*id).is_some_and(|o| doc.is_editable(o)))
        .collect();
    if modifiers.shift {
        for id in ids {
            doc.add_to_selection(id);
        }
    } else {
        doc.set_selection(ids);
    }
}

fn drag_shape(tool: ToolKind, start: Point, end: Point) -> Option<ShapeData> {
    match tool {
        ToolKind::Line => Some(ShapeData::Line { start, end }),
        ToolKind::Rectangle => {
            // An axis-locked second corner yields a zero-area rectangle.
            let size = end - start;
            (size.x.abs() > f64::EPSILON && size.y.abs() > f64::EPSILON)
                .then_some(ShapeData::Rectangle { corner1: start, corner2: end })
        }
        ToolKind::Circle => Some(ShapeData::Circle { center: start, radius: distance(start, end) }),
        _ => None,
    }
}

fn polyline_shape(points: Vec<Point>, closed: bool) -> Option<ShapeData> {
    let needed = if closed { 3 } else { 2 };
    (points.len() >= needed).then_some(ShapeData::Polyline { points, closed })
}

/// Arc from center, radius point and end-angle point.
fn arc_shape(points: &[Point]) -> Option<ShapeData> {
    let (center, on_radius, end) = (points[0], points[1], points[2]);
    let radius = distance(center, on_radius);
    if radius <= f64::EPSILON || distance(center, end) <= f64::EPSILON {
        return None;
    }
    Some(ShapeData::Arc {
        center,
        radius,
        start_angle: angle(center, on_radius),
        end_angle: angle(center, end),
    })
}

/// Kind of dimension implied by where the text is placed relative to the
/// measured points. One axis must dominate by 2:1, otherwise aligned.
pub fn infer_dimension_kind(p1: Point, p2: Point, placement: Point) -> DimensionKind {
    let offset = placement - midpoint(p1, p2);
    if offset.y.abs() > 2.0 * offset.x.abs() {
        DimensionKind::Horizontal
    } else if offset.x.abs() > 2.0 * offset.y.abs() {
        DimensionKind::Vertical
    } else {
        DimensionKind::Aligned
    }
}

fn dimension_shape(points: &[Point]) -> Option<ShapeData> {
    let (p1, p2, placement) = (points[0], points[1], points[2]);
    if distance(p1, p2) <= f64::EPSILON {
        return None;
    }
    Some(ShapeData::Dimension {
        kind: infer_dimension_kind(p1, p2, placement),
        points: vec![p1, p2],
        text_position: placement,
    })
}

/// Ellipse from center, major-axis endpoint and a point whose distance from
/// the major axis gives the minor radius.
fn ellipse_shape(points: &[Point]) -> Option<ShapeData> {
    let (center, major_end, minor_pick) = (points[0], points[1], points[2]);
    let major_radius = distance(center, major_end);
    if major_radius <= f64::EPSILON {
        return None;
    }
    let minor_radius = point_to_line_distance(minor_pick, center, major_end).min(major_radius);
    if minor_radius <= f64::EPSILON {
        return None;
    }
    Some(ShapeData::Ellipse {
        center,
        major_radius,
        minor_radius,
        rotation: angle(center, major_end),
    })
}

/// Rubber-band shape for a drawing tool given the fixed points plus the cursor.
fn preview_shape(tool: ToolKind, points: &[Point]) -> Option<ShapeData> {
    let last = *points.last()?;
    match (tool, points.len()) {
        (t, 2) if t.is_drag() => drag_shape(t, points[0], last),
        (ToolKind::Arc, 2) => Some(ShapeData::Circle { center: points[0], radius: distance(points[0], last) }),
        (ToolKind::Arc, 3) => arc_shape(points),
        (ToolKind::Dimension, 2) => Some(ShapeData::Line { start: points[0], end: last }),
        (ToolKind::Dimension, 3) => dimension_shape(points),
        (ToolKind::Ellipse, 2) => Some(ShapeData::Line { start: points[0], end: last }),
        (ToolKind::Ellipse, 3) => ellipse_shape(points),
        (ToolKind::Polyline, n) if n >= 2 => Some(ShapeData::Polyline { points: points.to_vec(), closed: false }),
        (ToolKind::Spline, n) if n >= 2 => Some(ShapeData::Spline {
            control_points: points.to_vec(),
            degree: SPLINE_DEGREE,
        }),
        _ => None,
    }
}

/// Transform a modify tool applies for a base point and a cursor position.
fn modify_transform(tool: ToolKind, base: Point, current: Point, scale_reference: f64) -> Option<Transform> {
    match tool {
        ToolKind::Move | ToolKind::Copy => Some(Transform::Translate(current - base)),
        ToolKind::Rotate => Some(Transform::Rotate { center: base, angle: angle(base, current) }),
        ToolKind::Scale => {
            let factor = distance(base, current) / scale_reference;
            (factor > f64::EPSILON && scale_reference > 0.0).then_some(Transform::Scale { center: base, factor })
        }
        ToolKind::Mirror => Some(Transform::Mirror { start: base, end: current }),
        _ => None,
    }
}

/// Apply a modify tool: move, rotate and scale edit in place, copy and mirror
/// add transformed duplicates.
fn apply_modify(doc: &mut CadDocument, tool: ToolKind, targets: &[ObjectId], transform: &Transform) -> Outcome {
    let in_place = matches!(tool, ToolKind::Move | ToolKind::Rotate | ToolKind::Scale);
    let mut changes = Changeset::default();
    let mut ids = Vec::new();
    for object in targets.iter().filter_map(|id| doc.get_object(*id)) {
        let moved = transform.apply_object(object);
        if in_place {
            ids.push(moved.id);
            changes.update(moved);
        } else {
            let copy = moved.duplicate();
            ids.push(copy.id);
            changes.add(copy);
        }
    }
    if doc.apply(changes) {
        log::debug!("{:?} applied to {} objects", tool, ids.len());
        Outcome::Committed(ids)
    } else {
        Outcome::Discarded
    }
}
