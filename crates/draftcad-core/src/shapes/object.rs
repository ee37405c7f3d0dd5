//! CAD objects: shape data plus the drawing attributes every object carries.

use super::{ShapeData, ShapeKind};
use crate::layer::LayerId;
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for objects.
pub type ObjectId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::white()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Dash pattern used when stroking an object or layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineType {
    #[default]
    Continuous,
    Dashed,
    Dotted,
    DashDot,
    Center,
    Hidden,
}

fn default_line_weight() -> f64 {
    0.25
}

fn default_true() -> bool {
    true
}

/// A drawable object in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadObject {
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    pub layer_id: LayerId,
    #[serde(default)]
    pub color: SerializableColor,
    #[serde(default)]
    pub line_type: LineType,
    /// Stroke width in millimetres.
    #[serde(default = "default_line_weight")]
    pub line_weight: f64,
    /// 0.0 is opaque, 1.0 fully transparent.
    #[serde(default)]
    pub transparency: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub selected: bool,
    pub data: ShapeData,
}

impl CadObject {
    pub fn new(layer_id: LayerId, data: ShapeData) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            layer_id,
            color: SerializableColor::default(),
            line_type: LineType::default(),
            line_weight: default_line_weight(),
            transparency: 0.0,
            locked: false,
            visible: true,
            selected: false,
            data,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.data.kind()
    }

    /// Copy of this object with a fresh id, unselected, holding `data`.
    pub fn derive(&self, data: ShapeData) -> Self {
        Self {
            id: Uuid::new_v4(),
            selected: false,
            data,
            ..self.clone()
        }
    }

    /// Copy of this object with the same geometry. The copy and any array
    /// sources nested in it get fresh ids.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.selected = false;
        copy.regenerate_id();
        copy
    }

    /// Assign a fresh id, recursing into array sources.
    fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
        if let ShapeData::ArrayRef { source_objects, .. } = &mut self.data {
            for child in source_objects {
                child.regenerate_id();
            }
        }
    }

    /// Whether snapping and picking may consider this object.
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.locked
    }

    /// Stroke color with transparency applied, for renderers.
    pub fn stroke_color(&self) -> Color {
        let alpha = (self.color.a as f64 * (1.0 - self.transparency.clamp(0.0, 1.0))) as u8;
        Color::from_rgba8(self.color.r, self.color.g, self.color.b, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn line() -> CadObject {
        CadObject::new(
            Uuid::new_v4(),
            ShapeData::Line { start: Point::ZERO, end: Point::new(1.0, 0.0) },
        )
    }

    #[test]
    fn test_derive_keeps_attributes() {
        let mut obj = line().with_name("edge");
        obj.selected = true;
        obj.line_type = LineType::Dashed;
        let copy = obj.derive(ShapeData::Circle { center: Point::ZERO, radius: 1.0 });
        assert_ne!(copy.id, obj.id);
        assert!(!copy.selected);
        assert_eq!(copy.layer_id, obj.layer_id);
        assert_eq!(copy.line_type, LineType::Dashed);
        assert_eq!(copy.kind(), ShapeKind::Circle);
    }

    #[test]
    fn test_duplicate_renews_nested_source_ids() {
        let source = line();
        let array = CadObject::new(
            Uuid::new_v4(),
            ShapeData::ArrayRef {
                source_objects: vec![source.clone()],
                associative: true,
                params: crate::array::ArrayParams::Polar {
                    center: Point::ZERO,
                    item_count: 3,
                    fill_angle_deg: 360.0,
                    clockwise: false,
                },
            },
        );
        let copy = array.duplicate();
        assert_ne!(copy.id, array.id);
        let ShapeData::ArrayRef { source_objects, .. } = &copy.data else {
            panic!("kind changed");
        };
        assert_ne!(source_objects[0].id, source.id);
        assert_eq!(source_objects[0].data, source.data);
    }

    #[test]
    fn test_color_roundtrip_through_peniko() {
        let c = SerializableColor::new(10, 20, 30, 255);
        let peniko: Color = c.into();
        assert_eq!(SerializableColor::from(peniko), c);
    }

    #[test]
    fn test_transparency_scales_alpha() {
        let mut obj = line();
        obj.transparency = 0.5;
        assert_eq!(obj.stroke_color().to_rgba8().a, 127);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let json = format!(
            r#"{{"id":"{}","layer_id":"{}","data":{{"type":"Circle","center":{{"x":0.0,"y":0.0}},"radius":2.0}}}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let obj: CadObject = serde_json::from_str(&json).unwrap();
        assert!(obj.visible);
        assert_eq!(obj.line_weight, 0.25);
        assert_eq!(obj.kind(), ShapeKind::Circle);
    }
}
