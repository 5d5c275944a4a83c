//! Resolved per-element geometry handed to the host.

use serde::Serialize;

use crate::model::{ItemAlignment, ItemId, ItemKind, ItemPath, Rect};

/// Final geometry of one element in one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutAttributes {
    /// Stable identity.
    pub id: ItemId,
    /// Position in the snapshot the attributes were computed for.
    pub path: ItemPath,
    /// Header, cell or footer.
    pub kind: ItemKind,
    /// Absolute frame with alignment resolved.
    pub frame: Rect,
    /// Horizontal alignment the frame was resolved with.
    pub alignment: ItemAlignment,
    /// Rendering order hint.
    pub z_index: i32,
}

/// How an element takes part in a batch animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Appears with the batch.
    Inserted,
    /// Disappears with the batch.
    Deleted,
    /// Exists on both sides of the batch.
    Persisted,
}

/// Attributes for an appearing or disappearing element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitionAttributes {
    /// Geometry to animate from (appearing) or to (disappearing).
    pub attributes: LayoutAttributes,
    /// Role in the batch.
    pub transition: Transition,
}
