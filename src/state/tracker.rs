//! Per-batch change tracking sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ItemKind, ItemPath};

/// Which elements a batch inserted, deleted, moved, reloaded or
/// reconfigured. Cleared on commit.
///
/// Before-update coordinates for deletions and move sources, after-update
/// coordinates for everything else. The ordered collections are what makes
/// compensation walk changes in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    pub(crate) inserted_sections: BTreeSet<usize>,
    pub(crate) deleted_sections: BTreeSet<usize>,
    pub(crate) reloaded_sections: BTreeSet<usize>,
    pub(crate) moved_sections: BTreeMap<usize, usize>,
    pub(crate) inserted_items: BTreeSet<ItemPath>,
    pub(crate) deleted_items: BTreeSet<ItemPath>,
    pub(crate) reloaded_items: BTreeSet<ItemPath>,
    pub(crate) reconfigured_items: BTreeSet<ItemPath>,
    pub(crate) moved_items: BTreeMap<ItemPath, ItemPath>,
}

impl ChangeTracker {
    /// True if nothing was tracked.
    pub fn is_empty(&self) -> bool {
        self.inserted_sections.is_empty()
            && self.deleted_sections.is_empty()
            && self.reloaded_sections.is_empty()
            && self.moved_sections.is_empty()
            && self.inserted_items.is_empty()
            && self.deleted_items.is_empty()
            && self.reloaded_items.is_empty()
            && self.reconfigured_items.is_empty()
            && self.moved_items.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// After-update indices of inserted sections.
    pub fn inserted_sections(&self) -> &BTreeSet<usize> {
        &self.inserted_sections
    }

    /// Before-update indices of deleted sections.
    pub fn deleted_sections(&self) -> &BTreeSet<usize> {
        &self.deleted_sections
    }

    /// After-update indices of reloaded sections.
    pub fn reloaded_sections(&self) -> &BTreeSet<usize> {
        &self.reloaded_sections
    }

    /// Moved sections, before-update index to after-update index.
    pub fn moved_sections(&self) -> &BTreeMap<usize, usize> {
        &self.moved_sections
    }

    /// After-update paths of inserted cells.
    pub fn inserted_items(&self) -> &BTreeSet<ItemPath> {
        &self.inserted_items
    }

    /// Before-update paths of deleted cells.
    pub fn deleted_items(&self) -> &BTreeSet<ItemPath> {
        &self.deleted_items
    }

    /// After-update paths of reloaded cells.
    pub fn reloaded_items(&self) -> &BTreeSet<ItemPath> {
        &self.reloaded_items
    }

    /// After-update paths of reconfigured cells.
    pub fn reconfigured_items(&self) -> &BTreeSet<ItemPath> {
        &self.reconfigured_items
    }

    /// Moved cells, before-update path to after-update path.
    pub fn moved_items(&self) -> &BTreeMap<ItemPath, ItemPath> {
        &self.moved_items
    }

    /// Whether the element at after-update `path` appears with this batch,
    /// either on its own or as part of an inserted section.
    pub fn is_inserted(&self, path: ItemPath, kind: ItemKind) -> bool {
        self.inserted_sections.contains(&path.section)
            || (kind == ItemKind::Cell && self.inserted_items.contains(&path))
    }

    /// Whether the element at before-update `path` disappears with this
    /// batch, either on its own or as part of a deleted section.
    pub fn is_deleted(&self, path: ItemPath, kind: ItemKind) -> bool {
        self.deleted_sections.contains(&path.section)
            || (kind == ItemKind::Cell && self.deleted_items.contains(&path))
    }
}
