//! Snapshot-based undo/redo over the object collection.

use crate::shapes::{CadObject, ObjectId};
use std::collections::HashMap;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Objects and draw order at one point in time.
///
/// Layers, blocks and constraints are not part of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    pub objects: HashMap<ObjectId, CadObject>,
    pub z_order: Vec<ObjectId>,
}

/// Undo and redo stacks.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<ObjectSnapshot>,
    redo_stack: Vec<ObjectSnapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state before a change. Clears the redo stack and drops the
    /// oldest entry past [`MAX_UNDO_HISTORY`].
    pub fn record(&mut self, before: ObjectSnapshot) {
        self.undo_stack.push(before);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last recorded state, saving `current` for redo.
    pub fn undo(&mut self, current: ObjectSnapshot) -> Option<ObjectSnapshot> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(snapshot)
    }

    /// Pop the last undone state, saving `current` for undo.
    pub fn redo(&mut self, current: ObjectSnapshot) -> Option<ObjectSnapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
