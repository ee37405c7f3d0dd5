//! Pointer events delivered to the interaction session.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Angle constraint while drawing; additive selection with the select tool.
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false };

    pub fn shift() -> Self {
        Self { shift: true, ..Self::NONE }
    }
}

/// Pointer event in world coordinates. The host converts from screen space
/// with [`crate::view::ViewState::inverse_transform`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, modifiers: Modifiers },
    Move { position: Point, modifiers: Modifiers },
    Up { position: Point, modifiers: Modifiers },
}

impl PointerEvent {
    pub fn down(position: Point) -> Self {
        PointerEvent::Down { position, modifiers: Modifiers::NONE }
    }

    pub fn moved(position: Point) -> Self {
        PointerEvent::Move { position, modifiers: Modifiers::NONE }
    }

    pub fn up(position: Point) -> Self {
        PointerEvent::Up { position, modifiers: Modifiers::NONE }
    }

    /// Same event with different modifiers.
    pub fn with_modifiers(self, modifiers: Modifiers) -> Self {
        match self {
            PointerEvent::Down { position, .. } => PointerEvent::Down { position, modifiers },
            PointerEvent::Move { position, .. } => PointerEvent::Move { position, modifiers },
            PointerEvent::Up { position, .. } => PointerEvent::Up { position, modifiers },
        }
    }

    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => *position,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            PointerEvent::Down { modifiers, .. }
            | PointerEvent::Move { modifiers, .. }
            | PointerEvent::Up { modifiers, .. } => *modifiers,
        }
    }
}
