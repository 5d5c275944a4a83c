//! Content-offset snapshots: remember which element sits at a visible edge
//! so the same element can be put back there after a full reload or a
//! width change.

use serde::Serialize;

use crate::model::{ItemId, ItemKind, ItemPath};

/// Which visible edge a snapshot is taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Remember the first visible element and its distance below the top edge.
    Top,
    /// Remember the last visible element and its distance above the bottom edge.
    Bottom,
}

/// An element pinned to a visible edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContentOffsetSnapshot {
    /// Edge the element was measured against.
    pub edge: Edge,
    /// Identity of the element.
    pub id: ItemId,
    /// Kind of the element.
    pub kind: ItemKind,
    /// Position at capture time, used when the identity no longer resolves.
    pub path: ItemPath,
    /// Distance from the edge: top edge to the element's top for
    /// [`Edge::Top`], element's bottom to the bottom edge for
    /// [`Edge::Bottom`].
    pub distance: f64,
}
