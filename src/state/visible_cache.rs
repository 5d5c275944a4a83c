//! Visible-region scan and its per-snapshot cache.
//!
//! A query rect is answered from the cache when it lies inside the last
//! scanned key: the previous rect widened by half its own size in each
//! direction, so small scroll deltas never rescan. The cache holds one
//! entry per snapshot and is cleared on every mutation.

use tracing::trace;

use super::attributes::LayoutAttributes;
use super::frames::FrameResolver;
use crate::model::{LayoutModel, ModelState, Rect};

/// Coarse skips start this far above the query so float noise in
/// accumulated offsets can never skip a touching element.
const SKIP_SLACK: f64 = 1.0;

/// The region an element must intersect to count as visible.
///
/// During a batch an element also counts when it intersects the rect
/// moved by the pending compensation, so animating elements do not pop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VisibleRegion {
    rect: Rect,
    compensated: Option<Rect>,
}

impl VisibleRegion {
    pub(crate) fn new(rect: Rect, pending_compensation: Option<f64>) -> Self {
        let compensated = pending_compensation
            .filter(|&offset| offset != 0.0)
            .map(|offset| rect.offset_by(0.0, offset));
        Self { rect, compensated }
    }

    /// The cache key for this region.
    fn widened(&self) -> Self {
        let rect = self.rect;
        let (dx, dy) = (rect.width() / 2.0, rect.height() / 2.0);
        Self {
            rect: rect.outset_by(dx, dy),
            compensated: self.compensated.map(|r| r.outset_by(dx, dy)),
        }
    }

    fn contains(&self, other: &VisibleRegion) -> bool {
        self.rect.contains_rect(&other.rect)
            && match (self.compensated, other.compensated) {
                (Some(outer), Some(inner)) => outer.contains_rect(&inner),
                (None, None) => true,
                _ => false,
            }
    }

    pub(crate) fn includes(&self, frame: &Rect) -> bool {
        frame.intersects(&self.rect) || self.compensated.is_some_and(|r| frame.intersects(&r))
    }

    fn lower_bound(&self) -> f64 {
        self.compensated
            .map_or(self.rect.min_y(), |r| r.min_y().min(self.rect.min_y()))
    }

    fn upper_bound(&self) -> f64 {
        self.compensated
            .map_or(self.rect.max_y(), |r| r.max_y().max(self.rect.max_y()))
    }
}

/// Whether to use offset monotonicity to skip and stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Binary-search the first candidate and stop past the region.
    Accelerated,
    /// Visit every element.
    Exhaustive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Traversal {
    NotFound,
    Found,
    Done,
}

/// Collect attributes of every element whose frame intersects `region`,
/// in top-to-bottom order.
pub(crate) fn scan(
    model: &LayoutModel,
    resolver: &FrameResolver,
    region: &VisibleRegion,
    mode: ScanMode,
) -> Vec<LayoutAttributes> {
    let accelerated = mode == ScanMode::Accelerated;
    let lower = region.lower_bound() - resolver.shift() - SKIP_SLACK;
    let upper = region.upper_bound();

    let first_section = if accelerated {
        model
            .section_offsets()
            .partition_point(|&offset| offset <= lower)
            .saturating_sub(1)
    } else {
        0
    };

    let mut result = Vec::new();
    let mut traversal = Traversal::NotFound;
    let mut visited = 0usize;

    'sections: for section_index in first_section..model.len() {
        let (Some(section), Some(offset)) = (model.section(section_index), model.section_offset(section_index))
        else {
            break;
        };
        let first_item = if accelerated && section_index == first_section {
            section
                .items()
                .partition_point(|item| offset + item.max_y() <= lower)
        } else {
            0
        };

        let elements = section
            .header()
            .map(|header| (0, header))
            .into_iter()
            .chain(section.items().iter().enumerate().skip(first_item))
            .chain(section.footer().map(|footer| (0, footer)));

        for (index, item) in elements {
            visited += 1;
            let attributes = resolver.attributes(offset, item, section_index, index);
            if accelerated && attributes.frame.min_y() >= upper {
                traversal = Traversal::Done;
                break 'sections;
            }
            if region.includes(&attributes.frame) {
                traversal = Traversal::Found;
                result.push(attributes);
            }
        }
    }

    trace!(?traversal, visited, found = result.len(), "visible scan");
    result
}

#[derive(Debug, Clone)]
struct CacheEntry {
    key: VisibleRegion,
    attributes: Vec<LayoutAttributes>,
}

/// One cached scan per snapshot.
#[derive(Debug, Clone, Default)]
pub(crate) struct VisibleAttributesCache {
    before: Option<CacheEntry>,
    after: Option<CacheEntry>,
}

impl VisibleAttributesCache {
    fn slot(&mut self, state: ModelState) -> &mut Option<CacheEntry> {
        match state {
            ModelState::BeforeUpdate => &mut self.before,
            ModelState::AfterUpdate => &mut self.after,
        }
    }

    /// Answer from the cache, or scan the widened region and remember it.
    pub(crate) fn get_or_scan(
        &mut self,
        state: ModelState,
        region: VisibleRegion,
        scan_widened: impl FnOnce(&VisibleRegion) -> Vec<LayoutAttributes>,
    ) -> Vec<LayoutAttributes> {
        let slot = self.slot(state);
        if let Some(entry) = slot.as_ref().filter(|entry| entry.key.contains(&region)) {
            trace!(%state, "visible attributes cache hit");
            return filter(&entry.attributes, &region);
        }

        trace!(%state, "visible attributes cache miss");
        let key = region.widened();
        let attributes = scan_widened(&key);
        let result = filter(&attributes, &region);
        *slot = Some(CacheEntry { key, attributes });
        result
    }

    /// Drop every cached scan.
    pub(crate) fn clear(&mut self) {
        self.before = None;
        self.after = None;
    }

    #[cfg(test)]
    fn is_cached(&self, state: ModelState) -> bool {
        match state {
            ModelState::BeforeUpdate => self.before.is_some(),
            ModelState::AfterUpdate => self.after.is_some(),
        }
    }
}

fn filter(attributes: &[LayoutAttributes], region: &VisibleRegion) -> Vec<LayoutAttributes> {
    attributes
        .iter()
        .filter(|attributes| region.includes(&attributes.frame))
        .copied()
        .collect()
}
