//! Layers and layer management.

use crate::document::{CadDocument, DocumentError};
use crate::shapes::{LineType, SerializableColor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for layers.
pub type LayerId = Uuid;

/// Name of the layer every new document starts with.
pub const DEFAULT_LAYER_NAME: &str = "0";

/// A named group of objects sharing display and edit state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub color: SerializableColor,
    #[serde(default)]
    pub line_type: LineType,
    pub line_weight: f64,
    pub visible: bool,
    /// Frozen layers are neither drawn nor edited.
    #[serde(default)]
    pub frozen: bool,
    /// Locked layers are drawn but not edited.
    #[serde(default)]
    pub locked: bool,
    /// Exactly one layer per document is current.
    #[serde(default)]
    pub current: bool,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: SerializableColor::white(),
            line_type: LineType::Continuous,
            line_weight: 0.25,
            visible: true,
            frozen: false,
            locked: false,
            current: false,
        }
    }

    /// Whether objects on this layer are drawn.
    pub fn is_displayed(&self) -> bool {
        self.visible && !self.frozen
    }

    /// Whether objects on this layer can be picked, snapped to and modified.
    pub fn is_editable(&self) -> bool {
        self.is_displayed() && !self.locked
    }
}

impl CadDocument {
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn get_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer, DocumentError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(DocumentError::LayerNotFound(id))
    }

    /// The current layer. New objects land here.
    pub fn current_layer(&self) -> &Layer {
        self.layers
            .iter()
            .find(|l| l.current)
            .unwrap_or(&self.layers[0])
    }

    pub fn current_layer_id(&self) -> LayerId {
        self.current_layer().id
    }

    /// Add a layer and return its id. The current layer is unchanged.
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let layer = Layer::new(name);
        let id = layer.id;
        log::debug!("Added layer {} ({})", layer.name, id);
        self.layers.push(layer);
        id
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> Result<(), DocumentError> {
        self.layer_mut(id)?.name = name.into();
        Ok(())
    }

    /// Make `id` the current layer, clearing the flag on every other layer.
    pub fn set_current_layer(&mut self, id: LayerId) -> Result<(), DocumentError> {
        let layer = self.get_layer(id).ok_or(DocumentError::LayerNotFound(id))?;
        if layer.frozen {
            return Err(DocumentError::LayerFrozen(id));
        }
        for layer in &mut self.layers {
            layer.current = layer.id == id;
        }
        Ok(())
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> Result<(), DocumentError> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    /// Freeze or thaw a layer. The current layer cannot be frozen.
    pub fn set_layer_frozen(&mut self, id: LayerId, frozen: bool) -> Result<(), DocumentError> {
        let layer = self.layer_mut(id)?;
        if frozen && layer.current {
            return Err(DocumentError::CurrentLayerFrozen);
        }
        layer.frozen = frozen;
        Ok(())
    }

    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> Result<(), DocumentError> {
        self.layer_mut(id)?.locked = locked;
        Ok(())
    }

    /// Delete a layer. Its objects move to the first remaining layer, which
    /// also becomes current if the deleted layer was.
    pub fn delete_layer(&mut self, id: LayerId) -> Result<(), DocumentError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(DocumentError::LayerNotFound(id))?;
        if self.layers.len() == 1 {
            return Err(DocumentError::LastLayer);
        }

        let removed = self.layers.remove(index);
        let fallback = self.layers[0].id;
        let mut moved = 0;
        for object in self.objects.values_mut().filter(|o| o.layer_id == id) {
            object.layer_id = fallback;
            moved += 1;
        }
        if removed.current {
            self.layers[0].current = true;
            self.layers[0].frozen = false;
        }
        log::info!("Deleted layer {}; reassigned {} objects", removed.name, moved);
        Ok(())
    }

    /// Whether objects on `layer_id` can be edited. Unknown layers are not.
    pub fn layer_editable(&self, layer_id: LayerId) -> bool {
        self.get_layer(layer_id).is_some_and(Layer::is_editable)
    }

    pub fn layer_displayed(&self, layer_id: LayerId) -> bool {
        self.get_layer(layer_id).is_some_and(Layer::is_displayed)
    }

    /// Restore the layer invariants: at least one layer, exactly one current,
    /// every object on an existing layer. Returns whether anything changed.
    pub(crate) fn repair_layers(&mut self) -> bool {
        let mut repaired = false;
        if self.layers.is_empty() {
            self.layers.push(Layer::new(DEFAULT_LAYER_NAME));
            repaired = true;
        }
        let current_count = self.layers.iter().filter(|l| l.current).count();
        if current_count != 1 {
            let keep = self.layers.iter().position(|l| l.current).unwrap_or(0);
            for (i, layer) in self.layers.iter_mut().enumerate() {
                layer.current = i == keep;
            }
            repaired = true;
        }
        let fallback = self.layers[0].id;
        let known: Vec<LayerId> = self.layers.iter().map(|l| l.id).collect();
        for object in self.objects.values_mut() {
            if !known.contains(&object.layer_id) {
                object.layer_id = fallback;
                repaired = true;
            }
        }
        repaired
    }
}
