//! Block definitions and block references.

use crate::array::expand_array;
use crate::document::{CadDocument, Changeset, DocumentError};
use crate::geometry::Transform;
use crate::shapes::{BlockAttribute, CadObject, ObjectId, ShapeData};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for blocks.
pub type BlockId = Uuid;

/// Nesting limit shared by block references and associative arrays.
const MAX_BLOCK_DEPTH: usize = 8;

/// A named template of objects. Child coordinates are relative to `base_point`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    pub base_point: Point,
    /// Children in block-local coordinates; the block owns these copies.
    pub objects: Vec<CadObject>,
    #[serde(default)]
    pub attributes: Vec<BlockAttribute>,
}

impl Block {
    /// Place the block's children in world space: scale, then rotate, then
    /// translate to `insertion_point`.
    pub fn place(&self, insertion_point: Point, scale: f64, rotation: f64) -> Vec<CadObject> {
        let chain = [
            Transform::Scale { center: Point::ZERO, factor: scale },
            Transform::Rotate { center: Point::ZERO, angle: rotation },
            Transform::Translate(insertion_point.to_vec2()),
        ];
        self.objects
            .iter()
            .map(|child| {
                let data = chain.iter().fold(child.data.clone(), |acc, t| t.apply(&acc));
                child.derive(data)
            })
            .collect()
    }
}

impl CadDocument {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get_block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn find_block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Define a block from existing objects. Children are copied into
    /// coordinates relative to `base_point`; with `replace` the originals are
    /// swapped for a single reference to the new block.
    pub fn define_block(
        &mut self,
        name: impl Into<String>,
        base_point: Point,
        object_ids: &[ObjectId],
        replace: bool,
    ) -> Result<BlockId, DocumentError> {
        let name = name.into();
        if self.find_block(&name).is_some() {
            return Err(DocumentError::DuplicateBlockName(name));
        }
        let to_local = Transform::Translate(-base_point.to_vec2());
        let mut children = Vec::with_capacity(object_ids.len());
        for id in object_ids {
            let object = self.get_object(*id).ok_or(DocumentError::ObjectNotFound(*id))?;
            let mut child = to_local.apply_object(object);
            child.selected = false;
            children.push(child);
        }
        if children.is_empty() {
            return Err(DocumentError::EmptyBlock);
        }

        let block = Block {
            id: Uuid::new_v4(),
            name,
            base_point,
            objects: children,
            attributes: Vec::new(),
        };
        let block_id = block.id;
        log::info!("Defined block {} with {} objects", block.name, block.objects.len());
        self.blocks.push(block);

        if replace {
            let mut changes = Changeset::default();
            changes.removed.extend_from_slice(object_ids);
            changes.add(self.block_reference(block_id, base_point, 1.0, 0.0));
            self.apply(changes);
        }
        Ok(block_id)
    }

    fn block_reference(&self, block_id: BlockId, insertion_point: Point, scale: f64, rotation: f64) -> CadObject {
        let attributes = self
            .get_block(block_id)
            .map(|b| b.attributes.clone())
            .unwrap_or_default();
        CadObject::new(
            self.current_layer_id(),
            ShapeData::BlockRef {
                block_id,
                insertion_point,
                scale,
                rotation,
                attributes,
            },
        )
    }

    /// Insert a reference to an existing block.
    pub fn insert_block(
        &mut self,
        block_id: BlockId,
        insertion_point: Point,
        scale: f64,
        rotation: f64,
    ) -> Result<ObjectId, DocumentError> {
        if self.get_block(block_id).is_none() {
            return Err(DocumentError::BlockNotFound(block_id));
        }
        let reference = self.block_reference(block_id, insertion_point, scale, rotation);
        let id = reference.id;
        let mut changes = Changeset::default();
        changes.add(reference);
        self.apply(changes);
        Ok(id)
    }

    /// Delete a block definition. References to it resolve to nothing afterwards.
    pub fn delete_block(&mut self, block_id: BlockId) -> Result<Block, DocumentError> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.id == block_id)
            .ok_or(DocumentError::BlockNotFound(block_id))?;
        Ok(self.blocks.remove(index))
    }

    /// Move a block's base point without moving its placed geometry.
    pub fn set_block_base_point(&mut self, block_id: BlockId, base_point: Point) -> Result<(), DocumentError> {
        let block = self
            .blocks
            .iter_mut()
            .find(|b| b.id == block_id)
            .ok_or(DocumentError::BlockNotFound(block_id))?;
        let shift = Transform::Translate(block.base_point - base_point);
        for child in &mut block.objects {
            child.data = shift.apply(&child.data);
        }
        block.base_point = base_point;
        Ok(())
    }

    /// World-space objects for a block reference. Nested references and
    /// associative arrays are expanded; a missing block yields nothing.
    pub fn resolve_block_ref(&self, object: &CadObject) -> Vec<CadObject> {
        if !matches!(object.data, ShapeData::BlockRef { .. }) {
            return Vec::new();
        }
        self.expand_nested(object, 0)
    }

    /// Expand block references and associative arrays down to plain objects.
    /// Both kinds of nesting count against the same depth budget.
    pub(crate) fn expand_nested(&self, object: &CadObject, depth: usize) -> Vec<CadObject> {
        if !matches!(object.data, ShapeData::BlockRef { .. } | ShapeData::ArrayRef { .. }) {
            return vec![object.clone()];
        }
        if depth >= MAX_BLOCK_DEPTH {
            log::warn!("Object {} nests deeper than {} levels", object.id, MAX_BLOCK_DEPTH);
            return Vec::new();
        }

        let children = match &object.data {
            ShapeData::BlockRef { block_id, insertion_point, scale, rotation, .. } => {
                let Some(block) = self.get_block(*block_id) else {
                    log::warn!("Block reference {} points to missing block {}", object.id, block_id);
                    return Vec::new();
                };
                block
                    .place(*insertion_point, *scale, *rotation)
                    .into_iter()
                    .map(|mut child| {
                        child.layer_id = object.layer_id;
                        child.selected = object.selected;
                        child
                    })
                    .collect()
            }
            _ => expand_array(object),
        };
        children
            .iter()
            .flat_map(|child| self.expand_nested(child, depth + 1))
            .collect()
    }

    /// Whether `target` is reachable from block `from` through references.
    fn block_reaches(&self, from: BlockId, target: BlockId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(block) = self.get_block(id) {
                for child in &block.objects {
                    referenced_blocks(child, &mut stack);
                }
            }
        }
        false
    }

    /// Drop block children that lead back to their own block, directly or
    /// through array sources.
    pub(crate) fn break_block_cycles(&mut self) {
        for index in 0..self.blocks.len() {
            let block_id = self.blocks[index].id;
            let keep: Vec<bool> = self.blocks[index]
                .objects
                .iter()
                .map(|child| {
                    let mut refs = Vec::new();
                    referenced_blocks(child, &mut refs);
                    !refs.into_iter().any(|r| self.block_reaches(r, block_id))
                })
                .collect();
            if keep.iter().all(|k| *k) {
                continue;
            }
            let block = &mut self.blocks[index];
            log::warn!("Removed self-referencing children from block {}", block.name);
            let mut keep = keep.into_iter();
            block.objects.retain(|_| keep.next().unwrap_or(true));
        }
    }
}

/// Block ids referenced by `object`, including those inside array sources.
fn referenced_blocks(object: &CadObject, out: &mut Vec<BlockId>) {
    match &object.data {
        ShapeData::BlockRef { block_id, .. } => out.push(*block_id),
        ShapeData::ArrayRef { source_objects, .. } => {
            for source in source_objects {
                referenced_blocks(source, out);
            }
        }
        _ => {}
    }
}
