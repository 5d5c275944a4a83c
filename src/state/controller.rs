//! State controller: the single authority the host talks to.
//!
//! Owns the committed snapshot, the in-flight after-update snapshot, the
//! change tracking sets, the compensation accumulators and the visible
//! attributes cache. Every call runs synchronously to completion.

use std::collections::HashSet;

use tracing::{debug, error, trace, warn};

use super::attributes::{LayoutAttributes, Transition, TransitionAttributes};
use super::changes::StructuralChange;
use super::compensation::CompensationState;
use super::diff;
use super::frames::FrameResolver;
use super::provider::{make_model, LayoutDataSource};
use super::snapshot::{ContentOffsetSnapshot, Edge};
use super::tracker::ChangeTracker;
use super::viewport::Viewport;
use super::visible_cache::{scan, ScanMode, VisibleAttributesCache, VisibleRegion};
use crate::config::{CompensationAnchor, LayoutSettings};
use crate::model::geometry::rounded;
use crate::model::{
    Item, ItemAlignment, ItemId, ItemKind, ItemPath, LayoutError, LayoutModel, ModelState, Rect,
    SectionId, Size,
};

/// Orchestrates the before/after snapshots for one scrolling list.
///
/// # Lifecycle
/// 1. [`reload_data`](Self::reload_data) builds the committed snapshot.
/// 2. [`process`](Self::process) applies a batch and creates the
///    after-update snapshot; compensation is decided here.
/// 3. The host queries both snapshots, reports measurements and consumes
///    compensation while it animates.
/// 4. [`commit`](Self::commit) promotes after-update to before-update.
#[derive(Debug, Clone)]
pub struct StateController {
    settings: LayoutSettings,
    viewport: Viewport,
    before: LayoutModel,
    after: Option<LayoutModel>,
    tracker: ChangeTracker,
    compensation: CompensationState,
    cache: VisibleAttributesCache,
}

impl StateController {
    /// Empty controller. Call [`reload_data`](Self::reload_data) to populate it.
    pub fn new(settings: LayoutSettings, viewport: Viewport) -> Self {
        let settings = settings.sanitized();
        Self {
            settings,
            viewport,
            before: LayoutModel::empty(settings),
            after: None,
            tracker: ChangeTracker::default(),
            compensation: CompensationState::default(),
            cache: VisibleAttributesCache::default(),
        }
    }

    /// Settings every snapshot is built with.
    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Current viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Replace the viewport. Cached frames survive a pure scroll but not a
    /// change of size or insets.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if !self.viewport.same_geometry(&viewport) {
            trace!(?viewport, "viewport geometry changed");
            self.cache.clear();
        }
        self.viewport = viewport;
    }

    /// Scroll to `y`.
    pub fn set_content_offset(&mut self, y: f64) {
        self.viewport = self.viewport.scrolled_to(y);
    }

    /// True between [`process`](Self::process) and [`commit`](Self::commit).
    pub fn is_batch_active(&self) -> bool {
        self.after.is_some()
    }

    /// What the in-flight batch did.
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Current compensation accumulators.
    pub fn compensation(&self) -> CompensationState {
        self.compensation
    }

    /// Snapshot for `state`. After-update exists only during a batch.
    pub fn model(&self, state: ModelState) -> Option<&LayoutModel> {
        match state {
            ModelState::BeforeUpdate => Some(&self.before),
            ModelState::AfterUpdate => {
                if self.after.is_none() {
                    warn!("after-update snapshot requested with no batch in progress");
                }
                self.after.as_ref()
            }
        }
    }

    /// Rebuild the committed snapshot from scratch and drop any batch.
    pub fn reload_data<S>(&mut self, source: &S)
    where
        S: LayoutDataSource + ?Sized,
    {
        if self.after.take().is_some() {
            warn!("full reload discards an uncommitted batch");
        }
        self.before = make_model(source, &self.settings);
        self.tracker.clear();
        self.compensation.reset();
        self.cache.clear();
        debug!(
            sections = self.before.len(),
            elements = self.before.element_count(),
            content_height = self.before.content_height(),
            "reloaded layout"
        );
    }

    /// Apply one batch of structural changes, producing the after-update
    /// snapshot and the batch's compensation.
    ///
    /// `source` must already describe the after-update state.
    ///
    /// # Errors
    /// [`LayoutError::BatchAlreadyActive`] if the previous batch was not
    /// committed, otherwise any error of the diff engine. Nothing is
    /// mutated on error.
    pub fn process<S>(&mut self, changes: &[StructuralChange], source: &S) -> Result<(), LayoutError>
    where
        S: LayoutDataSource + ?Sized,
    {
        if self.after.is_some() {
            return Err(LayoutError::BatchAlreadyActive);
        }
        let outcome = diff::apply_batch(&self.before, changes, source).inspect_err(|err| {
            error!(%err, changes = changes.len(), "rejected batch update");
        })?;

        self.after = Some(outcome.model);
        self.tracker = outcome.tracker;
        self.compensate_batch();
        self.cache.clear();

        debug!(
            changes = changes.len(),
            proposed = self.compensation.proposed(),
            "processed batch update"
        );
        Ok(())
    }

    /// Promote after-update to before-update and reset every per-batch
    /// accumulator.
    pub fn commit(&mut self) {
        match self.after.take() {
            Some(after) => self.before = after,
            None => debug!("commit with no batch in progress"),
        }
        self.tracker.clear();
        self.compensation.reset();
        self.cache.clear();
    }

    /// Absolute frame of an element.
    pub fn frame_for(&self, kind: ItemKind, path: ItemPath, state: ModelState) -> Option<Rect> {
        self.attributes_for(kind, path, state).map(|attributes| attributes.frame)
    }

    /// Full attributes of an element.
    pub fn attributes_for(&self, kind: ItemKind, path: ItemPath, state: ModelState) -> Option<LayoutAttributes> {
        let model = self.model(state)?;
        let attributes = FrameResolver::new(model, &self.viewport).attributes_at(model, path, kind);
        if attributes.is_none() {
            warn!(?kind, %path, %state, "attributes requested for missing element");
        }
        attributes
    }

    /// Every element intersecting `rect`, top to bottom. Answered from the
    /// cache when possible.
    pub fn visible_attributes(&mut self, rect: Rect, state: ModelState) -> Vec<LayoutAttributes> {
        let model = match state {
            ModelState::BeforeUpdate => &self.before,
            ModelState::AfterUpdate => match self.after.as_ref() {
                Some(after) => after,
                None => {
                    warn!("visible attributes requested for after-update with no batch in progress");
                    return Vec::new();
                }
            },
        };
        let resolver = FrameResolver::new(model, &self.viewport);
        let region = VisibleRegion::new(rect, self.pending_for(state));
        self.cache.get_or_scan(state, region, |key| {
            scan(model, &resolver, key, ScanMode::Accelerated)
        })
    }

    /// Uncached visible attributes, for diagnostics and verification.
    pub fn scan_attributes(&self, rect: Rect, state: ModelState, mode: ScanMode) -> Vec<LayoutAttributes> {
        let Some(model) = self.model(state) else {
            return Vec::new();
        };
        let resolver = FrameResolver::new(model, &self.viewport);
        scan(model, &resolver, &VisibleRegion::new(rect, self.pending_for(state)), mode)
    }

    /// Scrollable content size.
    pub fn content_size(&self, state: ModelState) -> Option<Size> {
        let model = self.model(state)?;
        let resolver = FrameResolver::new(model, &self.viewport);
        let insets = self.viewport.adjusted_content_insets;
        Some(Size::new(
            self.viewport.size.width - insets.horizontal(),
            model.content_height() + resolver.shift(),
        ))
    }

    /// Identity of the element at `path`.
    pub fn identity_at(&self, path: ItemPath, kind: ItemKind, state: ModelState) -> Option<ItemId> {
        self.model(state)?.item_id(path, kind)
    }

    /// Where the element with identity `id` is in `state`.
    pub fn path_for(&self, id: ItemId, state: ModelState) -> Option<ItemPath> {
        self.location_for(id, state).map(|(path, _)| path)
    }

    /// Path and kind of the element with identity `id`.
    pub fn location_for(&self, id: ItemId, state: ModelState) -> Option<(ItemPath, ItemKind)> {
        self.model(state)?.item_location(id)
    }

    /// Identity of section `index`.
    pub fn section_identity_at(&self, index: usize, state: ModelState) -> Option<SectionId> {
        self.model(state)?.section(index).map(|section| section.id())
    }

    /// Index of the section with identity `id`.
    pub fn section_index_for(&self, id: SectionId, state: ModelState) -> Option<usize> {
        self.model(state)?.section_index(id)
    }

    /// Record the host's exact measurement of an element, reassemble and
    /// compensate.
    ///
    /// A measurement of the committed snapshot during a batch is mirrored
    /// into the after-update snapshot unless the batch reloaded that element.
    ///
    /// # Errors
    /// [`LayoutError::NoActiveBatch`] for after-update outside a batch,
    /// or an out-of-range error if `path` does not address an element.
    pub fn update_measured_size(
        &mut self,
        kind: ItemKind,
        path: ItemPath,
        size: Size,
        state: ModelState,
    ) -> Result<(), LayoutError> {
        let visible = self.viewport.visible_bounds();
        let edge = anchor_edge(self.settings.compensation_anchor, &visible);
        let model = match state {
            ModelState::BeforeUpdate => &mut self.before,
            ModelState::AfterUpdate => self.after.as_mut().ok_or(LayoutError::NoActiveBatch)?,
        };
        let mut item = checked_element(model, path, kind, state)?.clone();
        let id = item.id();
        let old_height = item.height();
        item.set_calculated_size(size);
        model.set_and_assemble(path, kind, item);

        if let (Some(edge), Some(new_frame)) = (edge, model.element_frame(path, kind)) {
            let pending = self.compensation.pending();
            if bigger_than_visible(model.content_height(), visible.height(), pending) {
                let applied = self.compensation.on_measure(old_height, new_frame, edge);
                trace!(%path, applied, batch_update = self.compensation.batch_update(), "measurement compensation");
            }
        }

        if state == ModelState::BeforeUpdate {
            self.mirror_measurement(id, size);
        }
        self.cache.clear();
        Ok(())
    }

    fn mirror_measurement(&mut self, id: ItemId, size: Size) {
        let Some(after) = self.after.as_mut() else {
            return;
        };
        let Some((path, kind)) = after.item_location(id) else {
            return;
        };
        if kind == ItemKind::Cell && self.tracker.reloaded_items.contains(&path) {
            return;
        }
        if let Some(mut item) = after.element(path, kind).cloned() {
            item.set_calculated_size(size);
            after.set_and_assemble(path, kind, item);
        }
    }

    /// Change an element's alignment. Vertical geometry is untouched.
    ///
    /// # Errors
    /// As for [`update_measured_size`](Self::update_measured_size).
    pub fn update_alignment(
        &mut self,
        kind: ItemKind,
        path: ItemPath,
        alignment: ItemAlignment,
        state: ModelState,
    ) -> Result<(), LayoutError> {
        let model = match state {
            ModelState::BeforeUpdate => &mut self.before,
            ModelState::AfterUpdate => self.after.as_mut().ok_or(LayoutError::NoActiveBatch)?,
        };
        checked_element(model, path, kind, state)?;
        if let Some(item) = model
            .section_mut(path.section)
            .and_then(|section| section.element_mut(kind, path.item))
        {
            item.set_alignment(alignment);
        }
        self.cache.clear();
        Ok(())
    }

    /// Adjust a proposed scroll offset by the pending structural
    /// compensation, consuming it.
    pub fn target_content_offset(&mut self, proposed_y: f64) -> f64 {
        if self.compensation.proposed() == 0.0 {
            return proposed_y;
        }
        let adjusted = self.compensation.consume_proposed(proposed_y);
        self.cache.clear();
        trace!(proposed_y, adjusted, "consumed proposed compensation");
        adjusted
    }

    /// Hand out and clear the measurement compensation. Returns zero while
    /// a batch is in flight; the batch keeps it until commit.
    pub fn take_batch_update_compensating_offset(&mut self) -> f64 {
        if self.is_batch_active() {
            return 0.0;
        }
        let offset = self.compensation.take_batch_update();
        if offset != 0.0 {
            self.cache.clear();
        }
        offset
    }

    /// Shift a frame by the compensation already handed out in this batch:
    /// forward for frames moving to the after-update layout, `backward` for
    /// frames coming from it.
    pub fn offset_by_total_compensation(&self, frame: Rect, state: ModelState, backward: bool) -> Rect {
        if state != ModelState::AfterUpdate || self.settings.compensation_anchor == CompensationAnchor::Disabled {
            return frame;
        }
        let Some(after) = self.after.as_ref() else {
            return frame;
        };
        let visible_height = self.viewport.visible_bounds().height();
        if !bigger_than_visible(after.content_height(), visible_height, 0.0) {
            return frame;
        }
        let total = self.compensation.total_proposed();
        if !backward {
            frame.offset_by(0.0, total)
        } else if bigger_than_visible(after.content_height(), visible_height, self.compensation.pending()) {
            frame.offset_by(0.0, -total)
        } else {
            frame
        }
    }

    /// Attributes to animate an element at after-update `path` in from.
    ///
    /// Inserted elements start at their final frame moved back by the
    /// consumed compensation; persisting elements start where they were in
    /// the committed snapshot.
    pub fn appearing_attributes(&self, path: ItemPath, kind: ItemKind) -> Option<TransitionAttributes> {
        let Some(after) = self.after.as_ref() else {
            return self.attributes_for(kind, path, ModelState::BeforeUpdate).map(persisted);
        };
        let mut attributes = FrameResolver::new(after, &self.viewport).attributes_at(after, path, kind)?;

        if self.tracker.is_inserted(path, kind) {
            attributes.frame = self.offset_by_total_compensation(attributes.frame, ModelState::AfterUpdate, true);
            return Some(TransitionAttributes {
                attributes,
                transition: Transition::Inserted,
            });
        }
        if let Some(origin) = self.committed_attributes_of(attributes.id) {
            attributes.frame = origin.frame;
        }
        Some(persisted(attributes))
    }

    /// Attributes to animate an element at before-update `path` out to.
    ///
    /// Deleted elements leave from their old frame moved forward by the
    /// consumed compensation; persisting elements travel to where they end
    /// up in the after-update snapshot.
    pub fn disappearing_attributes(&self, path: ItemPath, kind: ItemKind) -> Option<TransitionAttributes> {
        let mut attributes = FrameResolver::new(&self.before, &self.viewport).attributes_at(&self.before, path, kind)?;
        let Some(after) = self.after.as_ref() else {
            return Some(persisted(attributes));
        };

        if self.tracker.is_deleted(path, kind) {
            attributes.frame = self.offset_by_total_compensation(attributes.frame, ModelState::AfterUpdate, false);
            return Some(TransitionAttributes {
                attributes,
                transition: Transition::Deleted,
            });
        }
        let destination = after
            .item_location(attributes.id)
            .and_then(|(path, kind)| FrameResolver::new(after, &self.viewport).attributes_at(after, path, kind));
        if let Some(destination) = destination {
            attributes.frame = destination.frame;
        }
        Some(persisted(attributes))
    }

    fn committed_attributes_of(&self, id: ItemId) -> Option<LayoutAttributes> {
        let (path, kind) = self.before.item_location(id)?;
        FrameResolver::new(&self.before, &self.viewport).attributes_at(&self.before, path, kind)
    }

    /// Remember the element at a visible edge of the committed snapshot.
    pub fn content_offset_snapshot(&self, edge: Edge) -> Option<ContentOffsetSnapshot> {
        let visible = self.viewport.visible_bounds();
        let resolver = FrameResolver::new(&self.before, &self.viewport);
        let found = scan(&self.before, &resolver, &VisibleRegion::new(visible, None), ScanMode::Accelerated);

        let (attributes, distance) = match edge {
            Edge::Top => {
                let first = found.first()?;
                (first, first.frame.min_y() - visible.min_y())
            }
            Edge::Bottom => {
                let last = found.last()?;
                (last, visible.max_y() - last.frame.max_y())
            }
        };
        Some(ContentOffsetSnapshot {
            edge,
            id: attributes.id,
            kind: attributes.kind,
            path: attributes.path,
            distance,
        })
    }

    /// Scroll offset that puts the remembered element back at the same
    /// distance from the same edge, clamped to the scrollable range.
    pub fn content_offset_for(&self, snapshot: &ContentOffsetSnapshot) -> Option<f64> {
        let model = &self.before;
        let (path, kind) = model.item_location(snapshot.id).or_else(|| {
            model
                .element(snapshot.path, snapshot.kind)
                .map(|_| (snapshot.path, snapshot.kind))
        })?;
        let frame = FrameResolver::new(model, &self.viewport)
            .attributes_at(model, path, kind)?
            .frame;

        let top_inset = self.viewport.adjusted_content_insets.top;
        let visible_height = self.viewport.visible_bounds().height();
        let offset = match snapshot.edge {
            Edge::Top => frame.min_y() - snapshot.distance - top_inset,
            Edge::Bottom => frame.max_y() + snapshot.distance - visible_height - top_inset,
        };
        let (min, max) = self.viewport.content_offset_range(model.content_height());
        Some(offset.clamp(min, max))
    }

    /// Demote every measurement to an estimate (container width changed)
    /// and reassemble both snapshots.
    pub fn invalidate_layout_metrics(&mut self) {
        self.before.reset_sizes();
        if let Some(after) = self.after.as_mut() {
            after.reset_sizes();
        }
        self.cache.clear();
        debug!(elements = self.before.element_count(), "invalidated layout metrics");
    }

    /// Drop cached visible attributes.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    fn pending_for(&self, state: ModelState) -> Option<f64> {
        (state == ModelState::AfterUpdate).then(|| self.compensation.pending())
    }

    /// Walk the tracking sets in a fixed order, each ascending, so every
    /// decision sees the anchor moved by the ones before it.
    fn compensate_batch(&mut self) {
        let visible = self.viewport.visible_bounds();
        let Some(edge) = anchor_edge(self.settings.compensation_anchor, &visible) else {
            return;
        };
        let Some(after) = self.after.as_ref() else {
            return;
        };
        let before = &self.before;
        let tracker = &self.tracker;
        let state = &mut self.compensation;
        let item_spacing = self.settings.inter_item_spacing;
        let section_spacing = self.settings.inter_section_spacing;
        let after_bigger = bigger_than_visible(after.content_height(), visible.height(), 0.0);
        let before_bigger = bigger_than_visible(before.content_height(), visible.height(), 0.0);
        // Spacing sits between cells: the first cell into an empty section
        // and the last one out of a section move content by their height only
        let mut gapless_sections: HashSet<SectionId> = HashSet::new();

        if after_bigger {
            // Spacing sits between sections, so the first section into an
            // empty list adds none
            let mut gapless = before.is_empty();
            for &index in &tracker.inserted_sections {
                if let Some(frame) = after.section_frame(index) {
                    let gap = if std::mem::take(&mut gapless) { 0.0 } else { section_spacing };
                    state.on_insert(frame, gap, edge);
                }
            }
            for &index in &tracker.reloaded_sections {
                let old_height = after
                    .section(index)
                    .and_then(|section| before.section_index(section.id()))
                    .and_then(|old| before.section(old))
                    .map(|section| section.height());
                if let (Some(old_height), Some(frame)) = (old_height, after.section_frame(index)) {
                    state.on_reload(old_height, frame, edge);
                }
            }
        }
        if before_bigger {
            let mut gapless = after.is_empty();
            for &index in &tracker.deleted_sections {
                if let Some(frame) = before.section_frame(index) {
                    let gap = if std::mem::take(&mut gapless) { 0.0 } else { section_spacing };
                    state.on_delete(frame, gap, edge);
                }
            }
        }
        if after_bigger {
            for &path in &tracker.reloaded_items {
                let old_height = after
                    .item_id(path, ItemKind::Cell)
                    .and_then(|id| before.item_location(id))
                    .and_then(|(old, kind)| before.element(old, kind))
                    .map(|item| item.height());
                if let (Some(old_height), Some(frame)) = (old_height, after.element_frame(path, ItemKind::Cell)) {
                    state.on_reload(old_height, frame, edge);
                }
            }
            for &path in &tracker.inserted_items {
                let Some(section) = after.section(path.section) else {
                    continue;
                };
                let was_empty = cell_count(before, section.id()) == 0;
                let gap = if was_empty && gapless_sections.insert(section.id()) {
                    0.0
                } else {
                    item_spacing
                };
                if let Some(frame) = after.element_frame(path, ItemKind::Cell) {
                    state.on_insert(frame, gap, edge);
                }
            }
        }
        if before_bigger {
            for &path in &tracker.deleted_items {
                let Some(section) = before.section(path.section) else {
                    continue;
                };
                let now_empty = cell_count(after, section.id()) == 0;
                let gap = if now_empty && gapless_sections.insert(section.id()) {
                    0.0
                } else {
                    item_spacing
                };
                if let Some(frame) = before.element_frame(path, ItemKind::Cell) {
                    state.on_delete(frame, gap, edge);
                }
            }
        }

        trace!(proposed = state.proposed(), "batch compensation decided");
    }
}

fn persisted(attributes: LayoutAttributes) -> TransitionAttributes {
    TransitionAttributes {
        attributes,
        transition: Transition::Persisted,
    }
}

/// The visible edge compensation keeps stationary, if any.
fn anchor_edge(anchor: CompensationAnchor, visible: &Rect) -> Option<f64> {
    match anchor {
        CompensationAnchor::Disabled => None,
        CompensationAnchor::Top => Some(visible.min_y()),
        CompensationAnchor::Bottom => Some(visible.max_y()),
    }
}

/// Compensation only makes sense once the content overflows the visible
/// area, optionally counting what is still pending.
fn bigger_than_visible(content_height: f64, visible_height: f64, pending: f64) -> bool {
    rounded(content_height) > rounded(visible_height + pending)
}

/// Number of cells in the section with identity `id`, zero if `model` has
/// no such section.
fn cell_count(model: &LayoutModel, id: SectionId) -> usize {
    model
        .section_index(id)
        .and_then(|index| model.section(index))
        .map_or(0, |section| section.len())
}

/// The element of `kind` at `path`, or the out-of-range error describing
/// which coordinate is missing.
fn checked_element<'a>(
    model: &'a LayoutModel,
    path: ItemPath,
    kind: ItemKind,
    state: ModelState,
) -> Result<&'a Item, LayoutError> {
    let section = model.section(path.section).ok_or(LayoutError::SectionOutOfRange {
        section: path.section,
        count: model.len(),
        state,
    })?;
    section.element(kind, path.item).ok_or(LayoutError::ItemOutOfRange {
        path,
        count: section.len(),
        state,
    })
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
