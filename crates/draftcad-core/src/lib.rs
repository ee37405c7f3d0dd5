//! DraftCAD Core Library
//!
//! Geometry core of a parametric 2D CAD editor: the document model with
//! layers, blocks and undo, object snapping, associative constraints,
//! interactive drawing tools, modify operations and arrays.

pub mod array;
pub mod block;
pub mod constraints;
pub mod document;
pub mod geometry;
pub mod history;
pub mod input;
pub mod layer;
pub mod ops;
pub mod settings;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod view;

pub use array::{ArrayParams, create_array, expand_array, update_array_params};
pub use block::{Block, BlockId};
pub use constraints::{ConstraintDef, ConstraintId, ConstraintType, SolveReport};
pub use document::{CadDocument, Changeset, DocumentError, LoadError, RenderSnapshot};
pub use geometry::Transform;
pub use input::{Modifiers, PointerEvent};
pub use layer::{Layer, LayerId};
pub use settings::{GridSettings, SnapSettings, UnitSettings};
pub use shapes::{CadObject, ObjectId, ShapeData, ShapeKind};
pub use snap::{SnapMode, SnapResult, find_snap_point, snap_to_grid};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use tools::{Outcome, Session, SessionState, ToolKind};
pub use view::ViewState;
