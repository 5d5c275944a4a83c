//! Positional addressing within a layout snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of an element: section index plus index within the section.
///
/// Only meaningful relative to one snapshot. Never used as identity across
/// snapshots; resolve through [`crate::model::ItemId`] instead. Headers and
/// footers use `item == 0`.
///
/// Ordering is lexicographic `(section, item)`, which is also top-to-bottom
/// order within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ItemPath {
    /// Section index.
    pub section: usize,
    /// Item index within the section.
    pub item: usize,
}

impl ItemPath {
    /// Create a new path.
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

impl From<(usize, usize)> for ItemPath {
    fn from((section, item): (usize, usize)) -> Self {
        Self::new(section, item)
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.section, self.item)
    }
}
