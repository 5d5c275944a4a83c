//! Scroll-offset compensation accumulators.
//!
//! Positions are compared after rounding to whole points so sub-pixel
//! float noise never flips a decision.

use serde::Serialize;

use crate::model::geometry::rounded;
use crate::model::Rect;

/// The three compensation accumulators of one batch.
///
/// # Lifecycle
/// - `proposed` collects structural adjustments (insert, delete, reload)
///   and is consumed by the next target-content-offset request.
/// - `batch_update` collects measurement adjustments and is handed out
///   with [`CompensationState::take_batch_update`].
/// - `total_proposed` is the running sum of consumed proposals, used to
///   keep already handed-out frames consistent.
///
/// All three reset to zero on commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CompensationState {
    proposed: f64,
    batch_update: f64,
    total_proposed: f64,
}

impl CompensationState {
    /// Pending structural adjustment.
    pub fn proposed(&self) -> f64 {
        self.proposed
    }

    /// Pending measurement adjustment.
    pub fn batch_update(&self) -> f64 {
        self.batch_update
    }

    /// Sum of proposals consumed so far in this batch.
    pub fn total_proposed(&self) -> f64 {
        self.total_proposed
    }

    /// Everything not yet applied by the host.
    pub fn pending(&self) -> f64 {
        self.proposed + self.batch_update
    }

    /// True if every accumulator is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Reset all accumulators.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply the pending proposal to a proposed content offset, move it
    /// into the running total and clear it.
    pub fn consume_proposed(&mut self, proposed_y: f64) -> f64 {
        let adjusted = proposed_y + self.proposed;
        self.total_proposed += self.proposed;
        self.proposed = 0.0;
        adjusted
    }

    /// Hand out and clear the measurement adjustment.
    pub fn take_batch_update(&mut self) -> f64 {
        std::mem::take(&mut self.batch_update)
    }

    /// Rounded anchor position: the visible edge moved by everything
    /// decided so far, so each decision sees the earlier ones.
    fn anchor(&self, edge: f64) -> f64 {
        rounded(edge + self.batch_update + self.proposed)
    }

    /// An element appeared at `frame`. Anything starting at or above the
    /// anchor pushes anchored content down by its height plus `gap`, the
    /// spacing the insertion added to the layout.
    pub fn on_insert(&mut self, frame: Rect, gap: f64, edge: f64) -> bool {
        let applies = rounded(frame.min_y()) - gap <= self.anchor(edge);
        if applies {
            self.proposed += frame.height() + gap;
        }
        applies
    }

    /// An element disappeared from `frame` (before-update coordinates),
    /// taking `gap` of spacing with it.
    pub fn on_delete(&mut self, frame: Rect, gap: f64, edge: f64) -> bool {
        let applies = rounded(frame.min_y()) <= self.anchor(edge);
        if applies {
            self.proposed -= frame.height() + gap;
        }
        applies
    }

    /// An element was reloaded; `new_frame` is its after-update frame.
    pub fn on_reload(&mut self, old_height: f64, new_frame: Rect, edge: f64) -> bool {
        let applies = rounded(new_frame.min_y()) <= self.anchor(edge);
        if applies {
            self.proposed += new_frame.height() - old_height;
        }
        applies
    }

    /// An element was measured; `new_frame` is its updated frame.
    pub fn on_measure(&mut self, old_height: f64, new_frame: Rect, edge: f64) -> bool {
        let applies = rounded(new_frame.min_y()) <= self.anchor(edge);
        if applies {
            self.batch_update += new_frame.height() - old_height;
        }
        applies
    }
}
