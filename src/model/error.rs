//! Error types for the layout engine.
//!
//! Every variant here is a **contract violation**: the host referenced a path
//! or identity that does not exist in the snapshot it addressed, or reported a
//! batch inconsistent with its own item counts. These indicate a bug in the
//! host integration.
//!
//! # Error Recovery Strategy
//!
//! - **Batch processing** validates against a private working copy and only
//!   swaps it in once everything applied. On error nothing is mutated: the
//!   snapshots, tracking sets and compensation accumulators stay as they were.
//! - **Queries** never return these errors; they return `None` (or an empty
//!   list) and log the inconsistency with `tracing::warn!`.
//! - **Degenerate geometry** (negative sizes, negative spacing) is not an
//!   error at all; it is clamped to zero where it enters the model.

use thiserror::Error;

use super::layout::ModelState;
use super::path::ItemPath;

/// Contract violations reported by the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A section index beyond the snapshot's section count.
    #[error("section {section} out of range: {state} snapshot has {count} sections")]
    SectionOutOfRange {
        /// Offending section index.
        section: usize,
        /// Number of sections in the addressed snapshot.
        count: usize,
        /// Snapshot the index was resolved against.
        state: ModelState,
    },

    /// An item index beyond its section's item count.
    #[error("item {path} out of range: section has {count} items in {state} snapshot")]
    ItemOutOfRange {
        /// Offending path.
        path: ItemPath,
        /// Number of items in the addressed section.
        count: usize,
        /// Snapshot the path was resolved against.
        state: ModelState,
    },

    /// Two changes in one batch target the same element or destination.
    #[error("conflicting changes in one batch: {0}")]
    ConflictingChanges(String),

    /// After applying a batch the model disagrees with the host's counts.
    #[error(
        "batch inconsistent with data source: section {section:?} expected {expected} \
         but layout has {actual}"
    )]
    InconsistentBatch {
        /// Section whose item count disagrees, or `None` for the section count.
        section: Option<usize>,
        /// Count reported by the host.
        expected: usize,
        /// Count produced by applying the batch.
        actual: usize,
    },

    /// A batch-only operation was requested with no batch in flight.
    #[error("no batch update in progress")]
    NoActiveBatch,

    /// A batch was started while another one is still uncommitted.
    #[error("a batch update is already in progress; commit it first")]
    BatchAlreadyActive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_out_of_range_message_names_state() {
        let err = LayoutError::SectionOutOfRange {
            section: 5,
            count: 3,
            state: ModelState::BeforeUpdate,
        };
        let message = err.to_string();
        assert!(message.contains("section 5"), "got: {message}");
        assert!(message.contains("before-update"), "got: {message}");
    }

    #[test]
    fn item_out_of_range_message_includes_path() {
        let err = LayoutError::ItemOutOfRange {
            path: ItemPath::new(1, 9),
            count: 4,
            state: ModelState::AfterUpdate,
        };
        assert!(err.to_string().contains("(1, 9)"));
    }

    #[test]
    fn inconsistent_batch_for_section_count() {
        let err = LayoutError::InconsistentBatch {
            section: None,
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("expected 3"));
    }
}
