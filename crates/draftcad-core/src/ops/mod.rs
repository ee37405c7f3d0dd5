//! Modify operations.
//!
//! Each operation reads the document, computes a [`Changeset`] and leaves
//! committing to [`CadDocument::apply`]. `None` means the input was
//! degenerate or unsupported and nothing should change.
//!
//! [`Changeset`]: crate::document::Changeset
//! [`CadDocument::apply`]: crate::document::CadDocument::apply

mod align;
mod corner;
mod explode;
mod join;
mod offset;
mod stretch;
mod trim;

pub use align::{align, align_transforms};
pub use corner::{chamfer, fillet};
pub use explode::{explode, explode_object};
pub use join::{JOIN_TOLERANCE, join};
pub use offset::{offset, offset_shape, offset_through};
pub use stretch::stretch;
pub use trim::{MIN_SEGMENT_LENGTH, break_line, extend, trim};

use crate::document::CadDocument;
use crate::shapes::{ObjectId, ShapeData};
use kurbo::Point;

/// Endpoints of an editable line object.
fn editable_line(doc: &CadDocument, id: ObjectId) -> Option<(Point, Point)> {
    let object = doc.get_object(id).filter(|o| doc.is_editable(o))?;
    match object.data {
        ShapeData::Line { start, end } => Some((start, end)),
        _ => None,
    }
}
