//! Layout data model (pure).
//!
//! Value types only: geometry primitives, elements, sections and the
//! assembled layout snapshot. Nothing here knows about batches or
//! compensation; see [`crate::state`] for that.

pub mod error;
pub mod geometry;
pub mod identifiers;
pub mod item;
pub mod layout;
pub mod path;
pub mod section;

// Re-export for convenience
pub use error::LayoutError;
pub use geometry::{EdgeInsets, Point, Rect, Size};
pub use identifiers::{ItemId, SectionId};
pub use item::{Item, ItemAlignment, ItemKind, ItemSize};
pub use layout::{LayoutModel, ModelState};
pub use path::ItemPath;
pub use section::Section;
