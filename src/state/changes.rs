//! Atomic structural change operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ItemPath;

/// One structural change in a batch update.
///
/// Coordinates follow the usual batch-update convention: deletes, reloads,
/// reconfigures and move sources address the before-update snapshot;
/// inserts and move destinations address the after-update snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StructuralChange {
    /// A new section appears at after-update index `at`.
    SectionInsert {
        /// Destination index.
        at: usize,
    },
    /// The section at before-update index `at` goes away.
    SectionDelete {
        /// Source index.
        at: usize,
    },
    /// A section keeps its identity and content but changes position.
    SectionMove {
        /// Before-update index.
        from: usize,
        /// After-update index.
        to: usize,
    },
    /// The section at before-update index `at` is rebuilt from the host.
    SectionReload {
        /// Source index.
        at: usize,
    },
    /// A new cell appears at after-update `path`.
    ItemInsert {
        /// Destination path.
        path: ItemPath,
    },
    /// The cell at before-update `path` goes away.
    ItemDelete {
        /// Source path.
        path: ItemPath,
    },
    /// A cell keeps its identity and size but changes position.
    ItemMove {
        /// Before-update path.
        from: ItemPath,
        /// After-update path.
        to: ItemPath,
    },
    /// The cell at before-update `path` is remeasured.
    ItemReload {
        /// Source path.
        path: ItemPath,
    },
    /// The cell at before-update `path` changed content without any
    /// geometry effect.
    ItemReconfigure {
        /// Source path.
        path: ItemPath,
    },
}

impl StructuralChange {
    /// True for the section-level variants.
    pub fn is_section_change(&self) -> bool {
        matches!(
            self,
            Self::SectionInsert { .. }
                | Self::SectionDelete { .. }
                | Self::SectionMove { .. }
                | Self::SectionReload { .. }
        )
    }
}

impl fmt::Display for StructuralChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SectionInsert { at } => write!(f, "insert section {at}"),
            Self::SectionDelete { at } => write!(f, "delete section {at}"),
            Self::SectionMove { from, to } => write!(f, "move section {from} -> {to}"),
            Self::SectionReload { at } => write!(f, "reload section {at}"),
            Self::ItemInsert { path } => write!(f, "insert item {path}"),
            Self::ItemDelete { path } => write!(f, "delete item {path}"),
            Self::ItemMove { from, to } => write!(f, "move item {from} -> {to}"),
            Self::ItemReload { path } => write!(f, "reload item {path}"),
            Self::ItemReconfigure { path } => write!(f, "reconfigure item {path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_json() {
        let changes: Vec<StructuralChange> = serde_json::from_str(
            r#"[
                { "op": "item_insert", "path": { "section": 0, "item": 3 } },
                { "op": "section_move", "from": 1, "to": 0 }
            ]"#,
        )
        .expect("valid changes");

        assert_eq!(
            changes,
            vec![
                StructuralChange::ItemInsert { path: ItemPath::new(0, 3) },
                StructuralChange::SectionMove { from: 1, to: 0 },
            ]
        );
    }

    #[test]
    fn section_changes_are_classified() {
        assert!(StructuralChange::SectionReload { at: 0 }.is_section_change());
        assert!(!StructuralChange::ItemReload { path: ItemPath::new(0, 0) }.is_section_change());
    }

    #[test]
    fn display_names_operation_and_coordinates() {
        let change = StructuralChange::ItemMove {
            from: ItemPath::new(0, 0),
            to: ItemPath::new(2, 0),
        };
        assert_eq!(change.to_string(), "move item (0, 0) -> (2, 0)");
    }
}
