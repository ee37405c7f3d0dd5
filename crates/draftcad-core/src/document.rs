//! The CAD document: objects, layers, blocks, settings and history.

use crate::block::{Block, BlockId};
use crate::constraints::{ConstraintDef, ConstraintType};
use crate::history::{History, ObjectSnapshot};
use crate::layer::{DEFAULT_LAYER_NAME, Layer, LayerId};
use crate::settings::{GridSettings, SnapSettings, UnitSettings};
use crate::shapes::{CadObject, ObjectId, ShapeData};
use crate::snap::{SnapResult, find_snap_point};
use crate::storage::{Storage, StorageResult};
use crate::view::ViewState;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Format tag written into every saved document.
pub const FORMAT_NAME: &str = "draftcad";

/// Current persisted format version.
pub const FORMAT_VERSION: u64 = 1;

/// Errors from structural document edits.
#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("layer not found: {0}")]
    LayerNotFound(LayerId),
    #[error("cannot delete the last layer")]
    LastLayer,
    #[error("layer {0} is frozen")]
    LayerFrozen(LayerId),
    #[error("the current layer cannot be frozen")]
    CurrentLayerFrozen,
    #[error("block not found: {0}")]
    BlockNotFound(BlockId),
    #[error("a block named {0:?} already exists")]
    DuplicateBlockName(String),
    #[error("a block needs at least one object")]
    EmptyBlock,
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),
    #[error("{0:?} constraint cannot relate {1} objects")]
    InvalidConstraint(ConstraintType, usize),
    #[error("{0:?} constraint needs a value")]
    MissingConstraintValue(ConstraintType),
}

/// Errors from loading a persisted document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document root must be a JSON object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unknown document format {0:?}")]
    UnknownFormat(String),
    #[error("unsupported document version {0}")]
    UnsupportedVersion(u64),
    #[error("document has no layers")]
    NoLayers,
}

/// A paper or model space tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: Uuid,
    pub name: String,
    /// The single model-space layout; every other layout is paper space.
    #[serde(default)]
    pub is_model: bool,
}

impl Layout {
    pub fn model() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Model".to_string(),
            is_model: true,
        }
    }
}

fn default_layouts() -> Vec<Layout> {
    vec![Layout::model()]
}

/// A set of object edits committed as one undoable step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub removed: Vec<ObjectId>,
    /// Replacements for existing objects, matched by id.
    pub updated: Vec<CadObject>,
    pub added: Vec<CadObject>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.updated.is_empty() && self.added.is_empty()
    }

    pub fn remove(&mut self, id: ObjectId) -> &mut Self {
        self.removed.push(id);
        self
    }

    pub fn update(&mut self, object: CadObject) -> &mut Self {
        self.updated.push(object);
        self
    }

    pub fn add(&mut self, object: CadObject) -> &mut Self {
        self.added.push(object);
        self
    }

    /// Append another changeset's edits.
    pub fn extend(&mut self, other: Changeset) {
        self.removed.extend(other.removed);
        self.updated.extend(other.updated);
        self.added.extend(other.added);
    }
}

/// Read-only view of the document for renderers and exporters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    /// Displayed objects back to front, with block references and
    /// associative arrays expanded into plain objects.
    pub objects: Vec<CadObject>,
    pub view: ViewState,
}

impl RenderSnapshot {
    /// Union of every object's bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .filter_map(|o| o.data.bounds())
            .reduce(|a, b| a.union(b))
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    format: &'static str,
    version: u64,
    state: &'a CadDocument,
}

/// A CAD document containing all objects and drawing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadDocument {
    /// Unique document identifier.
    pub id: Uuid,
    /// Document name.
    pub name: String,
    /// All objects, keyed by ID.
    pub(crate) objects: HashMap<ObjectId, CadObject>,
    /// Draw order of objects (back to front).
    #[serde(default)]
    pub(crate) z_order: Vec<ObjectId>,
    pub(crate) layers: Vec<Layer>,
    #[serde(default)]
    pub(crate) blocks: Vec<Block>,
    #[serde(default = "default_layouts")]
    pub layouts: Vec<Layout>,
    #[serde(default)]
    pub view: ViewState,
    #[serde(default)]
    pub snap: SnapSettings,
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub units: UnitSettings,
    #[serde(default)]
    pub(crate) constraints: Vec<ConstraintDef>,
    /// Selected object ids, mirrored into each object's `selected` flag.
    #[serde(skip)]
    selection: Vec<ObjectId>,
    #[serde(skip)]
    history: History,
}

impl Default for CadDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CadDocument {
    /// Create an empty document with a single current layer "0".
    pub fn new() -> Self {
        let mut layer = Layer::new(DEFAULT_LAYER_NAME);
        layer.current = true;
        Self {
            id: Uuid::new_v4(),
            name: "Untitled".to_string(),
            objects: HashMap::new(),
            z_order: Vec::new(),
            layers: vec![layer],
            blocks: Vec::new(),
            layouts: default_layouts(),
            view: ViewState::default(),
            snap: SnapSettings::default(),
            grid: GridSettings::default(),
            units: UnitSettings::default(),
            constraints: Vec::new(),
            selection: Vec::new(),
            history: History::new(),
        }
    }

    // --- History ---

    fn snapshot(&self) -> ObjectSnapshot {
        ObjectSnapshot {
            objects: self.objects.clone(),
            z_order: self.z_order.clone(),
        }
    }

    fn restore(&mut self, snapshot: ObjectSnapshot) {
        self.objects = snapshot.objects;
        self.z_order = snapshot.z_order;
        self.clear_selection();
        // A layer may have been deleted since the snapshot was taken.
        if self.repair_layers() {
            log::warn!("Restored objects referenced deleted layers; moved to the default layer");
        }
    }

    /// Push the current objects onto the undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.history.record(snapshot);
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Objects ---

    pub fn objects(&self) -> &HashMap<ObjectId, CadObject> {
        &self.objects
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&CadObject> {
        self.objects.get(&id)
    }

    /// Objects in draw order (back to front).
    pub fn objects_ordered(&self) -> impl Iterator<Item = &CadObject> {
        self.z_order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Commit a changeset as one undoable step.
    ///
    /// The whole changeset is rejected, leaving the document untouched, if an
    /// update targets a missing object or an addition reuses an existing id.
    /// Added objects on unknown layers move to the current layer. Returns
    /// whether anything was applied; empty changesets push no history.
    pub fn apply(&mut self, changes: Changeset) -> bool {
        if changes.is_empty() {
            return false;
        }
        let removed: HashSet<ObjectId> = changes.removed.iter().copied().collect();
        if let Some(missing) = changes
            .updated
            .iter()
            .find(|o| !self.objects.contains_key(&o.id) || removed.contains(&o.id))
        {
            log::warn!("Rejected changeset: update targets missing object {}", missing.id);
            return false;
        }
        let mut seen = HashSet::new();
        if let Some(dup) = changes
            .added
            .iter()
            .find(|o| (self.objects.contains_key(&o.id) && !removed.contains(&o.id)) || !seen.insert(o.id))
        {
            log::warn!("Rejected changeset: duplicate object id {}", dup.id);
            return false;
        }

        self.push_undo();

        for id in &changes.removed {
            self.objects.remove(id);
        }
        self.z_order.retain(|id| !removed.contains(id));
        self.selection.retain(|id| !removed.contains(id));

        for mut object in changes.updated {
            object.selected = self.selection.contains(&object.id);
            self.fix_layer(&mut object);
            self.objects.insert(object.id, object);
        }

        let added = changes.added.len();
        for mut object in changes.added {
            object.selected = false;
            self.fix_layer(&mut object);
            self.z_order.push(object.id);
            self.objects.insert(object.id, object);
        }

        log::debug!(
            "Applied changeset: {} removed, {} added, {} objects total",
            removed.len(),
            added,
            self.objects.len()
        );
        true
    }

    fn fix_layer(&self, object: &mut CadObject) {
        if self.get_layer(object.layer_id).is_none() {
            object.layer_id = self.current_layer_id();
        }
    }

    /// Add an object and return its id.
    pub fn add_object(&mut self, object: CadObject) -> ObjectId {
        let id = object.id;
        let mut changes = Changeset::default();
        changes.add(object);
        self.apply(changes);
        id
    }

    /// Replace an existing object (matched by id).
    pub fn update_object(&mut self, object: CadObject) -> bool {
        let mut changes = Changeset::default();
        changes.update(object);
        self.apply(changes)
    }

    /// Remove an object, returning it.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<CadObject> {
        let object = self.objects.get(&id)?.clone();
        let mut changes = Changeset::default();
        changes.remove(id);
        self.apply(changes);
        Some(object)
    }

    /// Delete every selected object. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let changes = Changeset {
            removed: self.selection.clone(),
            ..Default::default()
        };
        let count = changes.removed.len();
        if self.apply(changes) { count } else { 0 }
    }

    /// Remove all objects.
    pub fn clear(&mut self) {
        if self.objects.is_empty() {
            return;
        }
        self.push_undo();
        self.objects.clear();
        self.z_order.clear();
        self.selection.clear();
    }

    /// Bring an object to the front (topmost).
    pub fn bring_to_front(&mut self, id: ObjectId) {
        if self.objects.contains_key(&id) && self.z_order.last() != Some(&id) {
            self.push_undo();
            self.z_order.retain(|&o| o != id);
            self.z_order.push(id);
        }
    }

    /// Send an object to the back (bottommost).
    pub fn send_to_back(&mut self, id: ObjectId) {
        if self.objects.contains_key(&id) && self.z_order.first() != Some(&id) {
            self.push_undo();
            self.z_order.retain(|&o| o != id);
            self.z_order.insert(0, id);
        }
    }

    // --- Selection ---

    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selected_objects(&self) -> impl Iterator<Item = &CadObject> {
        self.selection.iter().filter_map(|id| self.objects.get(id))
    }

    fn set_flag(&mut self, id: ObjectId, selected: bool) {
        if let Some(object) = self.objects.get_mut(&id) {
            object.selected = selected;
        }
    }

    /// Replace the selection with `ids`. Unknown ids are ignored.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        self.clear_selection();
        for id in ids {
            self.add_to_selection(id);
        }
    }

    /// Select a single object, replacing the selection.
    pub fn select(&mut self, id: ObjectId) {
        self.set_selection([id]);
    }

    pub fn add_to_selection(&mut self, id: ObjectId) {
        if self.objects.contains_key(&id) && !self.selection.contains(&id) {
            self.selection.push(id);
            self.set_flag(id, true);
        }
    }

    pub fn toggle_selection(&mut self, id: ObjectId) {
        if self.selection.contains(&id) {
            self.selection.retain(|&s| s != id);
            self.set_flag(id, false);
        } else {
            self.add_to_selection(id);
        }
    }

    pub fn clear_selection(&mut self) {
        for id in std::mem::take(&mut self.selection) {
            self.set_flag(id, false);
        }
        for object in self.objects.values_mut() {
            object.selected = false;
        }
    }

    /// Select every visible, unlocked object on an editable layer.
    pub fn select_all(&mut self) {
        let ids: Vec<ObjectId> = self
            .objects_ordered()
            .filter(|o| self.is_editable(o))
            .map(|o| o.id)
            .collect();
        self.set_selection(ids);
    }

    // --- Queries ---

    /// Whether an object is drawn: visible itself and on a displayed layer.
    pub fn is_displayed(&self, object: &CadObject) -> bool {
        object.visible && self.layer_displayed(object.layer_id)
    }

    /// Whether an object can be picked, snapped to and modified.
    pub fn is_editable(&self, object: &CadObject) -> bool {
        object.is_interactive() && self.layer_editable(object.layer_id)
    }

    /// Plain objects an object draws as: block references and associative
    /// arrays are expanded, everything else is returned as is.
    pub fn expand_object(&self, object: &CadObject) -> Vec<CadObject> {
        self.expand_nested(object, 0)
    }

    /// Axis-aligned bounds of one object, resolving block references.
    pub fn object_bounds(&self, object: &CadObject) -> Option<Rect> {
        match &object.data {
            ShapeData::BlockRef { .. } | ShapeData::ArrayRef { .. } => self
                .expand_object(object)
                .iter()
                .filter_map(|o| o.data.bounds())
                .reduce(|a, b| a.union(b)),
            data => data.bounds(),
        }
    }

    /// Bounds of every object in the document.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects_ordered()
            .filter_map(|o| self.object_bounds(o))
            .reduce(|a, b| a.union(b))
    }

    fn object_hits(&self, object: &CadObject, point: Point, tolerance: f64) -> bool {
        match &object.data {
            ShapeData::BlockRef { .. } | ShapeData::ArrayRef { .. } => self
                .expand_object(object)
                .iter()
                .any(|o| o.data.hit_test(point, tolerance)),
            data => data.hit_test(point, tolerance),
        }
    }

    /// Displayed objects under `point`, front to back.
    pub fn objects_at_point(&self, point: Point, tolerance: f64) -> Vec<ObjectId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|id| self.objects.get(id))
            .filter(|o| self.is_displayed(o) && self.object_hits(o, point, tolerance))
            .map(|o| o.id)
            .collect()
    }

    /// The frontmost editable object under `point`.
    pub fn topmost_at(&self, point: Point, tolerance: f64) -> Option<ObjectId> {
        self.objects_at_point(point, tolerance)
            .into_iter()
            .find(|id| self.objects.get(id).is_some_and(|o| self.is_editable(o)))
    }

    /// Displayed objects selected by a window. A window selects objects lying
    /// entirely inside `rect`; a crossing window also selects objects that
    /// touch it.
    pub fn objects_in_window(&self, rect: Rect, crossing: bool) -> Vec<ObjectId> {
        self.objects_ordered()
            .filter(|o| self.is_displayed(o))
            .filter(|o| {
                if crossing {
                    self.expand_object(o).iter().any(|e| e.data.intersects_rect(rect))
                } else {
                    self.object_bounds(o).is_some_and(|b| rect.contains_rect(b))
                }
            })
            .map(|o| o.id)
            .collect()
    }

    /// Snapshot for renderers: displayed objects in draw order with block
    /// references and associative arrays expanded.
    pub fn render_snapshot(&self) -> RenderSnapshot {
        let objects = self
            .objects_ordered()
            .filter(|o| self.is_displayed(o))
            .flat_map(|o| self.expand_object(o))
            .collect();
        RenderSnapshot {
            objects,
            view: self.view.clone(),
        }
    }

    /// Plain objects eligible for object snap.
    pub fn snap_targets(&self) -> Vec<CadObject> {
        self.objects_ordered()
            .filter(|o| self.is_editable(o))
            .flat_map(|o| self.expand_object(o))
            .collect()
    }

    /// Object snap near `cursor` using the document's snap settings.
    pub fn find_snap(&self, cursor: Point, zoom: f64) -> Option<SnapResult> {
        if !self.snap.enabled {
            return None;
        }
        let targets = self.snap_targets();
        find_snap_point(cursor, &targets, &self.snap.modes, self.snap.aperture, zoom)
    }

    // --- Persistence ---

    /// Serialize to the tagged JSON format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Envelope {
            format: FORMAT_NAME,
            version: FORMAT_VERSION,
            state: self,
        })
    }

    /// Parse a document saved by [`CadDocument::to_json`].
    ///
    /// Fails on malformed JSON, a missing `version` or `state`, an
    /// unsupported version or a state without layers. Inconsistent layer
    /// flags, dangling layer ids, stale draw order and blocks that contain
    /// themselves are repaired.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        let root = value.as_object_mut().ok_or(LoadError::NotAnObject)?;

        if let Some(format) = root.get("format") {
            let format = format.as_str().unwrap_or_default();
            if format != FORMAT_NAME {
                return Err(LoadError::UnknownFormat(format.to_string()));
            }
        }
        let version = root
            .get("version")
            .ok_or(LoadError::MissingField("version"))?
            .as_u64()
            .ok_or(LoadError::UnsupportedVersion(0))?;
        if version == 0 || version > FORMAT_VERSION {
            return Err(LoadError::UnsupportedVersion(version));
        }
        let state = root.remove("state").ok_or(LoadError::MissingField("state"))?;

        let mut doc: CadDocument = serde_json::from_value(state)?;
        if doc.layers.is_empty() {
            return Err(LoadError::NoLayers);
        }
        doc.normalize_loaded();
        log::info!("Loaded document {} with {} objects", doc.name, doc.objects.len());
        Ok(doc)
    }

    /// Replace this document with one parsed from JSON. On failure the
    /// document is left unchanged.
    pub fn load_json(&mut self, json: &str) -> Result<(), LoadError> {
        *self = Self::from_json(json)?;
        Ok(())
    }

    /// Key the document is saved under: its id.
    pub fn storage_key(&self) -> String {
        self.id.to_string()
    }

    /// Save to `storage` under [`CadDocument::storage_key`].
    pub async fn save_to(&self, storage: &dyn Storage) -> StorageResult<()> {
        let key = self.storage_key();
        storage.save(&key, self).await?;
        log::info!("Saved document {} as {}", self.name, key);
        Ok(())
    }

    /// Replace this document with the one stored under `key`. On failure the
    /// document is left unchanged.
    pub async fn load_from(&mut self, storage: &dyn Storage, key: &str) -> StorageResult<()> {
        *self = storage.load(key).await?;
        Ok(())
    }

    fn normalize_loaded(&mut self) {
        if self.repair_layers() {
            log::warn!("Repaired layer assignments in loaded document");
        }
        self.break_block_cycles();

        let mut seen = HashSet::new();
        let before = self.z_order.len();
        let objects = &self.objects;
        self.z_order.retain(|id| objects.contains_key(id) && seen.insert(*id));
        let mut missing: Vec<ObjectId> = self.objects.keys().filter(|id| !seen.contains(*id)).copied().collect();
        missing.sort();
        if before != self.z_order.len() || !missing.is_empty() {
            log::warn!("Repaired draw order in loaded document");
        }
        self.z_order.extend(missing);

        if !self.layouts.iter().any(|l| l.is_model) {
            self.layouts.insert(0, Layout::model());
        }
        for object in self.objects.values_mut() {
            object.selected = false;
        }
        self.selection.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    fn line(doc: &CadDocument, x0: f64, y0: f64, x1: f64, y1: f64) -> CadObject {
        CadObject::new(
            doc.current_layer_id(),
            ShapeData::Line { start: Point::new(x0, y0), end: Point::new(x1, y1) },
        )
    }

    #[test]
    fn test_new_document() {
        let doc = CadDocument::new();
        assert!(doc.is_empty());
        assert!(!doc.can_undo());
        assert_eq!(doc.layouts.len(), 1);
    }

    #[test]
    fn test_add_and_remove_object() {
        let mut doc = CadDocument::new();
        let obj = line(&doc, 0.0, 0.0, 10.0, 0.0);
        let id = doc.add_object(obj.clone());
        assert_eq!(doc.get_object(id), Some(&obj));
        assert_eq!(doc.remove_object(id), Some(obj));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_undo_restores_exact_objects() {
        let mut doc = CadDocument::new();
        doc.add_object(line(&doc, 0.0, 0.0, 10.0, 0.0));
        let before = doc.objects().clone();

        let mut changes = Changeset::default();
        let target = doc.objects_ordered().next().unwrap().clone();
        changes.remove(target.id);
        changes.add(line(&doc, 0.0, 0.0, 5.0, 0.0));
        changes.add(line(&doc, 6.0, 0.0, 10.0, 0.0));
        assert!(doc.apply(changes));
        let after = doc.objects().clone();

        assert!(doc.undo());
        assert_eq!(doc.objects(), &before);
        assert!(doc.redo());
        assert_eq!(doc.objects(), &after);
    }

    #[test]
    fn test_empty_changeset_pushes_no_history() {
        let mut doc = CadDocument::new();
        assert!(!doc.apply(Changeset::default()));
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_changeset_with_missing_update_is_rejected() {
        let mut doc = CadDocument::new();
        let keep = doc.add_object(line(&doc, 0.0, 0.0, 1.0, 0.0));
        let ghost = line(&doc, 5.0, 5.0, 6.0, 6.0);
        let mut changes = Changeset::default();
        changes.remove(keep).update(ghost);
        assert!(!doc.apply(changes));
        assert!(doc.get_object(keep).is_some());
    }

    #[test]
    fn test_unknown_layer_moves_to_current() {
        let mut doc = CadDocument::new();
        let obj = CadObject::new(Uuid::new_v4(), ShapeData::Circle { center: Point::ZERO, radius: 1.0 });
        let id = doc.add_object(obj);
        assert_eq!(doc.get_object(id).unwrap().layer_id, doc.current_layer_id());
    }

    #[test]
    fn test_selection_mirrors_flags() {
        let mut doc = CadDocument::new();
        let a = doc.add_object(line(&doc, 0.0, 0.0, 1.0, 0.0));
        let b = doc.add_object(line(&doc, 0.0, 1.0, 1.0, 1.0));
        doc.select(a);
        doc.toggle_selection(b);
        assert!(doc.get_object(a).unwrap().selected && doc.get_object(b).unwrap().selected);
        doc.toggle_selection(a);
        assert!(!doc.get_object(a).unwrap().selected);
        assert_eq!(doc.selection(), &[b]);
        doc.clear_selection();
        assert!(doc.objects().values().all(|o| !o.selected));
    }

    #[test]
    fn test_select_all_skips_locked() {
        let mut doc = CadDocument::new();
        let mut locked = line(&doc, 0.0, 0.0, 1.0, 0.0);
        locked.locked = true;
        doc.add_object(locked);
        let free = doc.add_object(line(&doc, 0.0, 1.0, 1.0, 1.0));
        doc.select_all();
        assert_eq!(doc.selection(), &[free]);
    }

    #[test]
    fn test_undo_clears_selection() {
        let mut doc = CadDocument::new();
        let a = doc.add_object(line(&doc, 0.0, 0.0, 1.0, 0.0));
        doc.select(a);
        doc.add_object(line(&doc, 2.0, 0.0, 3.0, 0.0));
        doc.undo();
        assert!(doc.selection().is_empty());
    }

    #[test]
    fn test_hit_test_prefers_front() {
        let mut doc = CadDocument::new();
        let back = doc.add_object(line(&doc, 0.0, 0.0, 10.0, 0.0));
        let front = doc.add_object(line(&doc, 5.0, -5.0, 5.0, 5.0));
        assert_eq!(doc.topmost_at(Point::new(5.0, 0.0), 0.5), Some(front));
        doc.send_to_back(front);
        assert_eq!(doc.topmost_at(Point::new(5.0, 0.0), 0.5), Some(back));
    }

    #[test]
    fn test_window_versus_crossing() {
        let mut doc = CadDocument::new();
        let inside = doc.add_object(line(&doc, 1.0, 1.0, 2.0, 2.0));
        let crossing = doc.add_object(line(&doc, 5.0, -5.0, 5.0, 50.0));
        let window = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(doc.objects_in_window(window, false), vec![inside]);
        assert_eq!(doc.objects_in_window(window, true), vec![inside, crossing]);
    }

    #[test]
    fn test_hidden_layer_not_rendered() {
        let mut doc = CadDocument::new();
        let hidden = doc.add_layer("hidden");
        doc.add_object(CadObject::new(hidden, ShapeData::Circle { center: Point::ZERO, radius: 1.0 }));
        doc.add_object(line(&doc, 0.0, 0.0, 1.0, 0.0));
        doc.set_layer_visible(hidden, false).unwrap();
        assert_eq!(doc.render_snapshot().objects.len(), 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut doc = CadDocument::new();
        doc.name = "bracket".into();
        doc.add_object(line(&doc, 0.0, 0.0, 10.0, 0.0));
        doc.view.pan(Vec2::new(5.0, 5.0));
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"format\": \"draftcad\""));

        let loaded = CadDocument::from_json(&json).unwrap();
        assert_eq!(loaded.name, "bracket");
        assert_eq!(loaded.objects(), doc.objects());
        assert_eq!(loaded.view, doc.view);
        assert_eq!(loaded.layers(), doc.layers());
    }

    #[test]
    fn test_load_rejects_missing_fields() {
        let doc = CadDocument::new();
        let state = serde_json::to_value(&doc).unwrap();

        let no_version = serde_json::json!({ "state": state }).to_string();
        assert!(matches!(
            CadDocument::from_json(&no_version),
            Err(LoadError::MissingField("version"))
        ));

        let no_state = serde_json::json!({ "format": "draftcad", "version": 1 }).to_string();
        assert!(matches!(CadDocument::from_json(&no_state), Err(LoadError::MissingField("state"))));

        let future = serde_json::json!({ "version": 99, "state": state }).to_string();
        assert!(matches!(CadDocument::from_json(&future), Err(LoadError::UnsupportedVersion(99))));

        assert!(matches!(CadDocument::from_json("not json"), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_failed_load_leaves_document_unchanged() {
        let mut doc = CadDocument::new();
        doc.add_object(line(&doc, 0.0, 0.0, 10.0, 0.0));
        let before = doc.objects().clone();
        assert!(doc.load_json(r#"{"version": 1}"#).is_err());
        assert_eq!(doc.objects(), &before);
    }

    #[test]
    fn test_load_repairs_layers_and_draw_order() {
        let mut doc = CadDocument::new();
        doc.add_object(line(&doc, 0.0, 0.0, 10.0, 0.0));
        let mut value = serde_json::to_value(&doc).unwrap();
        value["layers"][0]["current"] = serde_json::json!(false);
        value["z_order"] = serde_json::json!([]);
        let json = serde_json::json!({ "format": "draftcad", "version": 1, "state": value }).to_string();

        let loaded = CadDocument::from_json(&json).unwrap();
        assert_eq!(loaded.layers().iter().filter(|l| l.current).count(), 1);
        assert_eq!(loaded.objects_ordered().count(), 1);
    }

    #[test]
    fn test_load_rejects_zero_layers() {
        let doc = CadDocument::new();
        let mut value = serde_json::to_value(&doc).unwrap();
        value["layers"] = serde_json::json!([]);
        let json = serde_json::json!({ "version": 1, "state": value }).to_string();
        assert!(matches!(CadDocument::from_json(&json), Err(LoadError::NoLayers)));
    }

    /// A block whose only path back to itself runs through an array source.
    fn self_referencing_block(doc: &mut CadDocument) -> BlockId {
        let layer = doc.current_layer_id();
        let block_id = Uuid::new_v4();
        let back_reference = CadObject::new(
            layer,
            ShapeData::BlockRef {
                block_id,
                insertion_point: Point::new(20.0, 0.0),
                scale: 1.0,
                rotation: 0.0,
                attributes: Vec::new(),
            },
        );
        let array = CadObject::new(
            layer,
            ShapeData::ArrayRef {
                source_objects: vec![back_reference],
                associative: true,
                params: crate::array::ArrayParams::Polar {
                    center: Point::ZERO,
                    item_count: 2,
                    fill_angle_deg: 360.0,
                    clockwise: false,
                },
            },
        );
        let circle = CadObject::new(layer, ShapeData::Circle { center: Point::ZERO, radius: 1.0 });
        doc.blocks.push(Block {
            id: block_id,
            name: "loop".into(),
            base_point: Point::ZERO,
            objects: vec![circle, array],
            attributes: Vec::new(),
        });
        block_id
    }

    #[test]
    fn test_nested_block_and_array_expansion_is_bounded() {
        let mut doc = CadDocument::new();
        let block_id = self_referencing_block(&mut doc);
        doc.insert_block(block_id, Point::ZERO, 1.0, 0.0).unwrap();
        let snapshot = doc.render_snapshot();
        assert_eq!(snapshot.objects.len(), 4);
        assert!(snapshot.objects.iter().all(|o| o.data.kind() == crate::shapes::ShapeKind::Circle));
        assert!(doc.bounds().is_some());
    }

    #[test]
    fn test_load_breaks_self_referencing_block() {
        let mut doc = CadDocument::new();
        let block_id = self_referencing_block(&mut doc);
        let json = doc.to_json().unwrap();

        let mut loaded = CadDocument::from_json(&json).unwrap();
        let block = loaded.get_block(block_id).unwrap();
        assert_eq!(block.objects.len(), 1);
        assert_eq!(block.objects[0].data.kind(), crate::shapes::ShapeKind::Circle);

        loaded.insert_block(block_id, Point::new(5.0, 0.0), 1.0, 0.0).unwrap();
        let snapshot = loaded.render_snapshot();
        assert_eq!(snapshot.objects.len(), 1);
        assert_eq!(snapshot.objects[0].data.center(), Some(Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_load_breaks_mutual_block_references() {
        let mut doc = CadDocument::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let layer = doc.current_layer_id();
        for (id, target, name) in [(a, b, "a"), (b, a, "b")] {
            let reference = CadObject::new(
                layer,
                ShapeData::BlockRef {
                    block_id: target,
                    insertion_point: Point::ZERO,
                    scale: 1.0,
                    rotation: 0.0,
                    attributes: Vec::new(),
                },
            );
            doc.blocks.push(Block {
                id,
                name: name.into(),
                base_point: Point::ZERO,
                objects: vec![reference],
                attributes: Vec::new(),
            });
        }
        let loaded = CadDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert!(loaded.get_block(a).unwrap().objects.is_empty());
        assert_eq!(loaded.get_block(b).unwrap().objects.len(), 1);
    }

    #[test]
    fn test_save_and_reopen_through_storage() {
        use crate::storage::{MemoryStorage, StorageError, block_on};

        let storage = MemoryStorage::new();
        let mut doc = CadDocument::new();
        doc.name = "gasket".into();
        let id = doc.add_object(line(&doc, 0.0, 0.0, 10.0, 0.0));
        doc.select(id);
        block_on(doc.save_to(&storage)).unwrap();
        assert_eq!(block_on(storage.list()).unwrap(), vec![doc.storage_key()]);

        let mut reopened = CadDocument::new();
        block_on(reopened.load_from(&storage, &doc.storage_key())).unwrap();
        assert_eq!(reopened.id, doc.id);
        assert_eq!(reopened.name, "gasket");
        assert_eq!(reopened.object_count(), 1);
        assert!(reopened.selection().is_empty());
        assert!(!reopened.can_undo());

        let before = reopened.objects().clone();
        let missing = block_on(reopened.load_from(&storage, "nowhere"));
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
        assert_eq!(reopened.objects(), &before);
    }
}
