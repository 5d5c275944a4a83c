//! Layout model: ordered sections with global offsets and identity index.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect};
use super::identifiers::{ItemId, SectionId};
use super::item::{Item, ItemKind};
use super::path::ItemPath;
use super::section::Section;
use crate::config::LayoutSettings;

/// Which of the two snapshots an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    /// The committed layout; always present.
    BeforeUpdate,
    /// The layout being built by an uncommitted batch.
    AfterUpdate,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelState::BeforeUpdate => "before-update",
            ModelState::AfterUpdate => "after-update",
        })
    }
}

/// Identity → position lookup, rebuilt on every global assembly.
#[derive(Debug, Default, PartialEq)]
struct IdentityIndex {
    sections: HashMap<SectionId, usize>,
    items: HashMap<ItemId, (ItemPath, ItemKind)>,
}

impl IdentityIndex {
    fn build(sections: &[Arc<Section>]) -> Self {
        let capacity = sections.iter().map(|s| s.len() + 2).sum();
        let mut index = Self {
            sections: HashMap::with_capacity(sections.len()),
            items: HashMap::with_capacity(capacity),
        };
        for (section_index, section) in sections.iter().enumerate() {
            index.sections.insert(section.id(), section_index);
            if let Some(header) = section.header() {
                index
                    .items
                    .insert(header.id(), (ItemPath::new(section_index, 0), ItemKind::Header));
            }
            for (item_index, item) in section.items().iter().enumerate() {
                index
                    .items
                    .insert(item.id(), (ItemPath::new(section_index, item_index), ItemKind::Cell));
            }
            if let Some(footer) = section.footer() {
                index
                    .items
                    .insert(footer.id(), (ItemPath::new(section_index, 0), ItemKind::Footer));
            }
        }
        index
    }
}

/// One complete layout snapshot.
///
/// Sections are shared copy-on-write: cloning a model is O(sections) and a
/// mutation through [`LayoutModel::section_mut`] copies only the section
/// being edited, so a clone can be edited freely without the original
/// observing it.
///
/// # Invariants
/// - `section_offsets[i]` is the top of section `i`; the first section starts
///   at the top additional inset and each following one starts
///   `inter_section_spacing` below the previous section's bottom edge.
/// - The identity index matches the section/item order as of the last
///   [`LayoutModel::assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutModel {
    settings: LayoutSettings,
    sections: Vec<Arc<Section>>,
    section_offsets: Vec<f64>,
    index: Arc<IdentityIndex>,
}

impl LayoutModel {
    /// Build and assemble a model from already-assembled sections.
    pub fn new(sections: Vec<Section>, settings: LayoutSettings) -> Self {
        let mut model = Self {
            settings: settings.sanitized(),
            sections: sections.into_iter().map(Arc::new).collect(),
            section_offsets: Vec::new(),
            index: Arc::default(),
        };
        model.assemble();
        model
    }

    /// A model with no sections.
    pub fn empty(settings: LayoutSettings) -> Self {
        Self::new(Vec::new(), settings)
    }

    /// Settings snapshot this model was built with.
    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True if there are no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of headers, cells and footers.
    pub fn element_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| s.len() + usize::from(s.header().is_some()) + usize::from(s.footer().is_some()))
            .sum()
    }

    /// Section at `index`.
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index).map(Arc::as_ref)
    }

    /// Sections in order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().map(Arc::as_ref)
    }

    /// Top edge of section `index`.
    pub fn section_offset(&self, index: usize) -> Option<f64> {
        self.section_offsets.get(index).copied()
    }

    /// Top edges of all sections, non-decreasing.
    pub fn section_offsets(&self) -> &[f64] {
        &self.section_offsets
    }

    /// Bottom edge of section `index`.
    pub fn section_max_y(&self, index: usize) -> Option<f64> {
        Some(self.section_offset(index)? + self.section(index)?.height())
    }

    /// Vertical extent of section `index` as a zero-width rectangle.
    pub fn section_frame(&self, index: usize) -> Option<Rect> {
        let offset = self.section_offset(index)?;
        let height = self.section(index)?.height();
        Some(Rect::new(0.0, offset, 0.0, height))
    }

    /// Height of all content including the top and bottom additional insets.
    pub fn content_height(&self) -> f64 {
        let insets = self.settings.additional_insets;
        let last_bottom = self
            .sections
            .len()
            .checked_sub(1)
            .and_then(|last| self.section_max_y(last))
            .unwrap_or(insets.top);
        last_bottom + insets.bottom
    }

    /// Walk sections assigning global offsets and rebuild the identity index.
    ///
    /// Sections must already be assembled.
    pub fn assemble(&mut self) {
        let spacing = self.settings.inter_section_spacing;
        let mut cursor = self.settings.additional_insets.top;
        self.section_offsets.clear();
        self.section_offsets.reserve(self.sections.len());
        let last = self.sections.len().saturating_sub(1);
        for (index, section) in self.sections.iter().enumerate() {
            self.section_offsets.push(cursor);
            cursor += section.height();
            if index < last {
                cursor += spacing;
            }
        }
        self.index = Arc::new(IdentityIndex::build(&self.sections));
    }

    /// Index of the section with identity `id`.
    pub fn section_index(&self, id: SectionId) -> Option<usize> {
        self.index.sections.get(&id).copied()
    }

    /// Path and kind of the element with identity `id`.
    pub fn item_location(&self, id: ItemId) -> Option<(ItemPath, ItemKind)> {
        self.index.items.get(&id).copied()
    }

    /// Element of `kind` at `path`.
    pub fn element(&self, path: ItemPath, kind: ItemKind) -> Option<&Item> {
        self.section(path.section)?.element(kind, path.item)
    }

    /// Identity of the element of `kind` at `path`.
    pub fn item_id(&self, path: ItemPath, kind: ItemKind) -> Option<ItemId> {
        self.element(path, kind).map(Item::id)
    }

    /// Frame of an element in model coordinates, before alignment: x is 0
    /// and the width is the element's own width.
    pub fn element_frame(&self, path: ItemPath, kind: ItemKind) -> Option<Rect> {
        let section_offset = self.section_offset(path.section)?;
        let item = self.element(path, kind)?;
        Some(Rect::from_origin_size(
            Point::new(0.0, section_offset + item.offset_y()),
            item.effective_size(),
        ))
    }

    /// Replace one element and propagate the height delta to everything
    /// below it: later elements of the same section, then later sections.
    ///
    /// Identities and paths are unchanged, so the identity index stays valid.
    /// Returns `false` if `path` does not address an element of `kind`.
    pub fn set_and_assemble(&mut self, path: ItemPath, kind: ItemKind, item: Item) -> bool {
        let spacing = self.settings.inter_item_spacing;
        if self.element(path, kind).is_none() {
            return false;
        }
        let Some(section) = self.sections.get_mut(path.section) else {
            return false;
        };
        let section = Arc::make_mut(section);
        let previous_height = section.height();
        match kind {
            ItemKind::Header => section.set_and_assemble_header(item, spacing),
            ItemKind::Footer => section.set_and_assemble_footer(item, spacing),
            ItemKind::Cell => {
                section.set_and_assemble_item(path.item, item);
            }
        }
        let delta = section.height() - previous_height;
        if delta != 0.0 {
            for offset in self.section_offsets.iter_mut().skip(path.section + 1) {
                *offset += delta;
            }
        }
        true
    }

    /// Mutable section access; copies the section if another snapshot shares it.
    /// The caller must reassemble the section and then the model.
    pub(crate) fn section_mut(&mut self, index: usize) -> Option<&mut Section> {
        self.sections.get_mut(index).map(Arc::make_mut)
    }

    /// Insert a section. The caller must reassemble the model.
    pub(crate) fn insert_section(&mut self, index: usize, section: Arc<Section>) {
        self.sections.insert(index, section);
    }

    /// Remove every section whose identity satisfies `remove`, returning the
    /// removed sections. The caller must reassemble the model.
    pub(crate) fn extract_sections<F>(&mut self, remove: F) -> Vec<Arc<Section>>
    where
        F: Fn(SectionId) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.sections.len());
        for section in self.sections.drain(..) {
            if remove(section.id()) {
                removed.push(section);
            } else {
                kept.push(section);
            }
        }
        self.sections = kept;
        removed
    }

    /// Demote every measured size to the preferred size and reassemble.
    ///
    /// Each section resets only its own elements, so with the `parallel`
    /// feature large models reset sections concurrently.
    pub(crate) fn reset_sizes(&mut self) {
        let spacing = self.settings.inter_item_spacing;
        let reset = |section: &mut Arc<Section>| {
            let section = Arc::make_mut(section);
            section.reset_sizes();
            section.assemble(spacing);
        };

        #[cfg(feature = "parallel")]
        {
            if self.element_count() >= self.settings.parallel_reset_threshold {
                use rayon::prelude::*;
                self.sections.par_iter_mut().for_each(reset);
                self.assemble();
                return;
            }
        }

        self.sections.iter_mut().for_each(reset);
        self.assemble();
    }
}
