//! Diff engine: turns a batch of structural changes into an after-update
//! snapshot.
//!
//! Works on a private copy-on-write copy of the before-update snapshot and
//! hands back the finished copy only if every change applied and the result
//! agrees with the host's counts. The caller swaps it in; on error nothing
//! observable changed.
//!
//! Application order:
//! 1. validate and resolve every before-update coordinate to an identity
//! 2. remove deleted and moved-out sections, then cells, by identity
//! 3. insert new and moved-in sections in ascending destination order
//! 4. insert new and moved-in cells in ascending destination order
//! 5. reload sections, then cells, by identity
//! 6. check counts and build the tracking sets in final coordinates

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use super::changes::StructuralChange;
use super::provider::{make_contents, make_item, make_section, LayoutDataSource};
use super::tracker::ChangeTracker;
use crate::config::LayoutSettings;
use crate::model::{
    Item, ItemId, ItemKind, ItemPath, ItemSize, LayoutError, LayoutModel, ModelState, Section,
    SectionId,
};

/// Result of a successfully applied batch.
#[derive(Debug)]
pub(crate) struct BatchOutcome {
    /// The after-update snapshot.
    pub(crate) model: LayoutModel,
    /// What the batch did, in final coordinates.
    pub(crate) tracker: ChangeTracker,
}

/// A batch with every before-update coordinate resolved to an identity.
#[derive(Debug, Default)]
struct ResolvedBatch {
    deleted_sections: Vec<(usize, SectionId)>,
    /// `(from, id, to)`
    moved_sections: Vec<(usize, SectionId, usize)>,
    reloaded_sections: Vec<SectionId>,
    inserted_sections: Vec<usize>,
    /// `(from, id, owning section)`
    deleted_items: Vec<(ItemPath, ItemId, SectionId)>,
    /// `(from, id, owning section, to)`
    moved_items: Vec<(ItemPath, ItemId, SectionId, ItemPath)>,
    reloaded_items: Vec<ItemId>,
    reconfigured_items: Vec<ItemId>,
    inserted_items: Vec<ItemPath>,
}

enum Arrival<T> {
    New,
    Moved(T),
}

/// Apply `changes` to a copy of `before`.
///
/// `source` must already describe the after-update state.
///
/// # Errors
/// - [`LayoutError::SectionOutOfRange`] / [`LayoutError::ItemOutOfRange`]
///   when a coordinate does not exist in the snapshot it addresses
/// - [`LayoutError::ConflictingChanges`] when two changes claim the same
///   source or destination
/// - [`LayoutError::InconsistentBatch`] when the result disagrees with the
///   host's counts
pub(crate) fn apply_batch<S>(
    before: &LayoutModel,
    changes: &[StructuralChange],
    source: &S,
) -> Result<BatchOutcome, LayoutError>
where
    S: LayoutDataSource + ?Sized,
{
    let batch = resolve(before, changes)?;
    let settings = *before.settings();
    let spacing = settings.inter_item_spacing;

    let mut working = before.clone();
    let mut dirty: HashSet<SectionId> = HashSet::new();

    // Sections out
    let moved_section_ids: HashSet<SectionId> =
        batch.moved_sections.iter().map(|&(_, id, _)| id).collect();
    let deleted_section_ids: HashSet<SectionId> =
        batch.deleted_sections.iter().map(|&(_, id)| id).collect();
    let mut held_sections: HashMap<SectionId, Arc<Section>> = working
        .extract_sections(|id| deleted_section_ids.contains(&id) || moved_section_ids.contains(&id))
        .into_iter()
        .filter(|section| moved_section_ids.contains(&section.id()))
        .map(|section| (section.id(), section))
        .collect();

    // Cells out
    let mut removals: HashMap<SectionId, HashSet<ItemId>> = HashMap::new();
    for &(_, id, section_id) in &batch.deleted_items {
        removals.entry(section_id).or_default().insert(id);
    }
    for &(_, id, section_id, _) in &batch.moved_items {
        removals.entry(section_id).or_default().insert(id);
    }
    let moved_item_ids: HashSet<ItemId> = batch.moved_items.iter().map(|&(_, id, _, _)| id).collect();
    let mut held_items: HashMap<ItemId, Item> = HashMap::new();
    for (section_id, ids) in &removals {
        let section = section_by_id(&mut working, &mut held_sections, *section_id).ok_or_else(|| {
            LayoutError::ConflictingChanges(format!("{section_id} vanished while removing its items"))
        })?;
        for item in section.extract_items(|id| ids.contains(&id)) {
            if moved_item_ids.contains(&item.id()) {
                held_items.insert(item.id(), item);
            }
        }
        dirty.insert(*section_id);
    }

    // Sections in
    let mut section_arrivals: Vec<(usize, Arrival<SectionId>)> = batch
        .inserted_sections
        .iter()
        .map(|&at| (at, Arrival::New))
        .chain(batch.moved_sections.iter().map(|&(_, id, to)| (to, Arrival::Moved(id))))
        .collect();
    section_arrivals.sort_by_key(|(at, _)| *at);

    let mut inserted_section_ids = Vec::with_capacity(batch.inserted_sections.len());
    for (at, arrival) in section_arrivals {
        if at > working.len() {
            return Err(LayoutError::SectionOutOfRange {
                section: at,
                count: working.len(),
                state: ModelState::AfterUpdate,
            });
        }
        let section = match arrival {
            Arrival::New => {
                let section = make_section(source, at, &settings);
                inserted_section_ids.push(section.id());
                trace!(at, id = %section.id(), "inserted section");
                Arc::new(section)
            }
            Arrival::Moved(id) => held_sections.remove(&id).ok_or_else(|| {
                LayoutError::ConflictingChanges(format!("{id} moved more than once"))
            })?,
        };
        working.insert_section(at, section);
    }

    // Cells in
    let mut item_arrivals: Vec<(ItemPath, Arrival<ItemId>)> = batch
        .inserted_items
        .iter()
        .map(|&path| (path, Arrival::New))
        .chain(batch.moved_items.iter().map(|&(_, id, _, to)| (to, Arrival::Moved(id))))
        .collect();
    item_arrivals.sort_by_key(|(path, _)| *path);

    let mut inserted_item_ids = Vec::with_capacity(batch.inserted_items.len());
    for (path, arrival) in item_arrivals {
        let count = working.len();
        let Some(section) = working.section_mut(path.section) else {
            return Err(LayoutError::SectionOutOfRange {
                section: path.section,
                count,
                state: ModelState::AfterUpdate,
            });
        };
        if path.item > section.len() {
            return Err(LayoutError::ItemOutOfRange {
                path,
                count: section.len(),
                state: ModelState::AfterUpdate,
            });
        }
        let item = match arrival {
            Arrival::New => {
                let item = make_item(source, ItemKind::Cell, path, &settings);
                inserted_item_ids.push(item.id());
                item
            }
            Arrival::Moved(id) => held_items.remove(&id).ok_or_else(|| {
                LayoutError::ConflictingChanges(format!("{id} moved more than once"))
            })?,
        };
        trace!(%path, id = %item.id(), "inserted item");
        section.insert_item(path.item, item);
        dirty.insert(section.id());
    }

    reassemble(&mut working, &mut dirty, spacing);

    // Reloads address identities, so they see the final positions
    for &id in &batch.reloaded_sections {
        let Some(index) = working.section_index(id) else {
            continue;
        };
        if let Some(section) = working.section_mut(index) {
            reload_section(section, index, source, &settings);
            dirty.insert(id);
            trace!(index, %id, "reloaded section");
        }
    }
    for &id in &batch.reloaded_items {
        let Some((path, kind)) = working.item_location(id) else {
            continue;
        };
        let Some(section) = working.section_mut(path.section) else {
            continue;
        };
        let section_id = section.id();
        // A reloaded section may have replaced the cell with a fresh one
        if let Some(item) = section.element_mut(kind, path.item).filter(|item| item.id() == id) {
            refresh_item(item, source, kind, path);
            dirty.insert(section_id);
            trace!(%path, %id, "reloaded item");
        }
    }

    reassemble(&mut working, &mut dirty, spacing);
    verify_counts(&working, source)?;

    let tracker = track(&working, &batch, &inserted_section_ids, &inserted_item_ids);
    Ok(BatchOutcome {
        model: working,
        tracker,
    })
}

/// Validate every change against `before` and resolve source coordinates
/// to identities.
fn resolve(before: &LayoutModel, changes: &[StructuralChange]) -> Result<ResolvedBatch, LayoutError> {
    let mut batch = ResolvedBatch::default();
    let mut claimed_sections: HashSet<usize> = HashSet::new();
    let mut section_destinations: HashSet<usize> = HashSet::new();
    let mut claimed_items: HashSet<ItemPath> = HashSet::new();
    let mut item_destinations: HashSet<ItemPath> = HashSet::new();

    let claim_section = |claimed: &mut HashSet<usize>, index: usize, change: &StructuralChange| {
        if claimed.insert(index) {
            Ok(())
        } else {
            Err(LayoutError::ConflictingChanges(format!(
                "section {index} is already the source of another change ({change})"
            )))
        }
    };
    let claim_destination = |claimed: &mut HashSet<usize>, index: usize, change: &StructuralChange| {
        if claimed.insert(index) {
            Ok(())
        } else {
            Err(LayoutError::ConflictingChanges(format!(
                "section destination {index} is used twice ({change})"
            )))
        }
    };
    let claim_item = |claimed: &mut HashSet<ItemPath>, path: ItemPath, what: &str, change: &StructuralChange| {
        if claimed.insert(path) {
            Ok(())
        } else {
            Err(LayoutError::ConflictingChanges(format!(
                "item {what} {path} is used twice ({change})"
            )))
        }
    };

    for change in changes {
        match *change {
            StructuralChange::SectionInsert { at } => {
                claim_destination(&mut section_destinations, at, change)?;
                batch.inserted_sections.push(at);
            }
            StructuralChange::SectionDelete { at } => {
                let id = before_section(before, at)?.id();
                claim_section(&mut claimed_sections, at, change)?;
                batch.deleted_sections.push((at, id));
            }
            StructuralChange::SectionMove { from, to } => {
                let id = before_section(before, from)?.id();
                claim_section(&mut claimed_sections, from, change)?;
                claim_destination(&mut section_destinations, to, change)?;
                batch.moved_sections.push((from, id, to));
            }
            StructuralChange::SectionReload { at } => {
                let id = before_section(before, at)?.id();
                claim_section(&mut claimed_sections, at, change)?;
                batch.reloaded_sections.push(id);
            }
            StructuralChange::ItemInsert { path } => {
                claim_item(&mut item_destinations, path, "destination", change)?;
                batch.inserted_items.push(path);
            }
            StructuralChange::ItemDelete { path } => {
                let (section_id, id) = before_cell(before, path)?;
                claim_item(&mut claimed_items, path, "source", change)?;
                batch.deleted_items.push((path, id, section_id));
            }
            StructuralChange::ItemMove { from, to } => {
                let (section_id, id) = before_cell(before, from)?;
                claim_item(&mut claimed_items, from, "source", change)?;
                claim_item(&mut item_destinations, to, "destination", change)?;
                batch.moved_items.push((from, id, section_id, to));
            }
            StructuralChange::ItemReload { path } => {
                let (_, id) = before_cell(before, path)?;
                claim_item(&mut claimed_items, path, "source", change)?;
                batch.reloaded_items.push(id);
            }
            StructuralChange::ItemReconfigure { path } => {
                let (_, id) = before_cell(before, path)?;
                claim_item(&mut claimed_items, path, "source", change)?;
                batch.reconfigured_items.push(id);
            }
        }
    }

    let deleted: HashSet<usize> = batch.deleted_sections.iter().map(|&(at, _)| at).collect();
    if let Some(path) = claimed_items.iter().find(|path| deleted.contains(&path.section)) {
        return Err(LayoutError::ConflictingChanges(format!(
            "item {path} belongs to a section deleted in the same batch"
        )));
    }
    let inserted: HashSet<usize> = batch.inserted_sections.iter().copied().collect();
    if let Some(path) = item_destinations.iter().find(|path| inserted.contains(&path.section)) {
        return Err(LayoutError::ConflictingChanges(format!(
            "item destination {path} is inside a section inserted in the same batch"
        )));
    }

    Ok(batch)
}

fn before_section(before: &LayoutModel, index: usize) -> Result<&Section, LayoutError> {
    before.section(index).ok_or(LayoutError::SectionOutOfRange {
        section: index,
        count: before.len(),
        state: ModelState::BeforeUpdate,
    })
}

fn before_cell(before: &LayoutModel, path: ItemPath) -> Result<(SectionId, ItemId), LayoutError> {
    let section = before_section(before, path.section)?;
    let item = section.item(path.item).ok_or(LayoutError::ItemOutOfRange {
        path,
        count: section.len(),
        state: ModelState::BeforeUpdate,
    })?;
    Ok((section.id(), item.id()))
}

/// Find a section by identity in the working copy or among the sections
/// held aside for a move.
fn section_by_id<'a>(
    working: &'a mut LayoutModel,
    held: &'a mut HashMap<SectionId, Arc<Section>>,
    id: SectionId,
) -> Option<&'a mut Section> {
    if let Some(section) = held.get_mut(&id) {
        return Some(Arc::make_mut(section));
    }
    let index = working.sections().position(|section| section.id() == id)?;
    working.section_mut(index)
}

fn reassemble(working: &mut LayoutModel, dirty: &mut HashSet<SectionId>, spacing: f64) {
    if !dirty.is_empty() {
        for index in 0..working.len() {
            let is_dirty = working
                .section(index)
                .is_some_and(|section| dirty.contains(&section.id()));
            if is_dirty {
                if let Some(section) = working.section_mut(index) {
                    section.assemble(spacing);
                }
            }
        }
        dirty.clear();
    }
    working.assemble();
}

/// Demote the measured size and pick up the host's current hints.
/// An exact hint counts as a fresh measurement.
fn refresh_item<S>(item: &mut Item, source: &S, kind: ItemKind, path: ItemPath)
where
    S: LayoutDataSource + ?Sized,
{
    item.reset_size();
    let (size, alignment) = source.size_and_alignment(kind, path);
    item.set_alignment(alignment);
    if let ItemSize::Exact(size) = size {
        item.set_calculated_size(size);
    }
}

/// Rebuild a section's content keeping its identity. Cells survive with
/// their last measurement as the estimate when the count is unchanged;
/// otherwise they are recreated from the host's hints.
fn reload_section<S>(section: &mut Section, index: usize, source: &S, settings: &LayoutSettings)
where
    S: LayoutDataSource + ?Sized,
{
    let (header, mut items, footer) = section.take_contents();
    let count = source.number_of_items(index);
    if items.len() != count {
        let (header, items, footer) = make_contents(source, index, settings);
        section.replace_contents(header, items, footer);
        return;
    }

    for (item_index, item) in items.iter_mut().enumerate() {
        refresh_item(item, source, ItemKind::Cell, ItemPath::new(index, item_index));
    }
    let supplementary = |existing: Option<Item>, present: bool, kind: ItemKind| {
        let path = ItemPath::new(index, 0);
        match (existing, present) {
            (Some(mut item), true) => {
                refresh_item(&mut item, source, kind, path);
                Some(item)
            }
            (None, true) => Some(make_item(source, kind, path, settings)),
            (_, false) => None,
        }
    };
    let header = supplementary(header, source.has_header(index), ItemKind::Header);
    let footer = supplementary(footer, source.has_footer(index), ItemKind::Footer);
    section.replace_contents(header, items, footer);
}

fn verify_counts<S>(working: &LayoutModel, source: &S) -> Result<(), LayoutError>
where
    S: LayoutDataSource + ?Sized,
{
    let expected = source.number_of_sections();
    if working.len() != expected {
        return Err(LayoutError::InconsistentBatch {
            section: None,
            expected,
            actual: working.len(),
        });
    }
    for (index, section) in working.sections().enumerate() {
        let expected = source.number_of_items(index);
        if section.len() != expected {
            return Err(LayoutError::InconsistentBatch {
                section: Some(index),
                expected,
                actual: section.len(),
            });
        }
    }
    Ok(())
}

fn track(
    after: &LayoutModel,
    batch: &ResolvedBatch,
    inserted_sections: &[SectionId],
    inserted_items: &[ItemId],
) -> ChangeTracker {
    let path_of = |id: ItemId| after.item_location(id).map(|(path, _)| path);
    let mut tracker = ChangeTracker::default();

    tracker.deleted_sections = batch.deleted_sections.iter().map(|&(at, _)| at).collect();
    tracker.inserted_sections = inserted_sections
        .iter()
        .filter_map(|&id| after.section_index(id))
        .collect();
    tracker.moved_sections = batch
        .moved_sections
        .iter()
        .filter_map(|&(from, id, _)| Some((from, after.section_index(id)?)))
        .collect();
    tracker.reloaded_sections = batch
        .reloaded_sections
        .iter()
        .filter_map(|&id| after.section_index(id))
        .collect();

    tracker.deleted_items = batch.deleted_items.iter().map(|&(path, _, _)| path).collect();
    tracker.inserted_items = inserted_items.iter().filter_map(|&id| path_of(id)).collect();
    tracker.moved_items = batch
        .moved_items
        .iter()
        .filter_map(|&(from, id, _, _)| Some((from, path_of(id)?)))
        .collect();
    tracker.reloaded_items = batch.reloaded_items.iter().filter_map(|&id| path_of(id)).collect();
    tracker.reconfigured_items = batch
        .reconfigured_items
        .iter()
        .filter_map(|&id| path_of(id))
        .collect();

    tracker
}
