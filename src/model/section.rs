//! Section model: an ordered run of cells with an optional header and footer.

use super::identifiers::{ItemId, SectionId};
use super::item::{Item, ItemKind};

/// Ordered cells plus optional header/footer, with section-local offsets.
///
/// The section's own position is held by the owning layout model so that
/// shifting it never forces a copy of a section shared between snapshots.
///
/// # Invariants
/// - Cell offsets are monotonically non-decreasing: the header sits at 0,
///   the first cell directly below it, each following cell one
///   `inter_item_spacing` below its predecessor, and the footer directly
///   below the last cell.
/// - `height` is the footer's bottom edge, else the last cell's, else the
///   header's, else zero.
///
/// Offsets are only valid immediately after [`Section::assemble`] or one of
/// the `set_and_assemble_*` mutators; the plain mutators leave the section
/// unassembled and the caller must reassemble it.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    id: SectionId,
    header: Option<Item>,
    footer: Option<Item>,
    items: Vec<Item>,
    height: f64,
}

impl Section {
    /// Create and assemble a section with a fresh identity.
    pub fn new(header: Option<Item>, items: Vec<Item>, footer: Option<Item>, inter_item_spacing: f64) -> Self {
        let mut section = Self {
            id: SectionId::next(),
            header,
            footer,
            items,
            height: 0.0,
        };
        section.assemble(inter_item_spacing);
        section
    }

    /// Stable identity.
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Header, if presented.
    pub fn header(&self) -> Option<&Item> {
        self.header.as_ref()
    }

    /// Footer, if presented.
    pub fn footer(&self) -> Option<&Item> {
        self.footer.as_ref()
    }

    /// Cells in order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Cell at `index`.
    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Element of `kind` at `index`. Headers and footers live at index 0.
    pub fn element(&self, kind: ItemKind, index: usize) -> Option<&Item> {
        match kind {
            ItemKind::Header if index == 0 => self.header.as_ref(),
            ItemKind::Footer if index == 0 => self.footer.as_ref(),
            ItemKind::Cell => self.items.get(index),
            _ => None,
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the section has no cells.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Height derived at the last assembly.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Locate an element by identity: its kind and index within the section.
    pub fn position_of(&self, id: ItemId) -> Option<(ItemKind, usize)> {
        if self.header.as_ref().is_some_and(|h| h.id() == id) {
            return Some((ItemKind::Header, 0));
        }
        if self.footer.as_ref().is_some_and(|f| f.id() == id) {
            return Some((ItemKind::Footer, 0));
        }
        self.items
            .iter()
            .position(|item| item.id() == id)
            .map(|index| (ItemKind::Cell, index))
    }

    /// Walk the elements in order assigning section-local offsets.
    ///
    /// O(n) in the number of cells. Never resolves horizontal alignment.
    pub fn assemble(&mut self, inter_item_spacing: f64) {
        let mut cursor = 0.0;

        if let Some(header) = self.header.as_mut() {
            header.set_offset_y(0.0);
            cursor = header.height();
        }

        let last = self.items.len().saturating_sub(1);
        for (index, item) in self.items.iter_mut().enumerate() {
            item.set_offset_y(cursor);
            cursor += item.height();
            if index < last {
                cursor += inter_item_spacing;
            }
        }

        if let Some(footer) = self.footer.as_mut() {
            footer.set_offset_y(cursor);
        }

        self.height = self.compute_height();
    }

    fn compute_height(&self) -> f64 {
        if let Some(footer) = &self.footer {
            return footer.max_y();
        }
        if let Some(last) = self.items.last() {
            return last.max_y();
        }
        self.header.as_ref().map_or(0.0, Item::max_y)
    }

    /// Replace the header and shift everything below it by the height delta.
    pub fn set_and_assemble_header(&mut self, header: Item, inter_item_spacing: f64) {
        match self.header.as_ref() {
            Some(previous) => {
                let delta = header.height() - previous.height();
                let mut header = header;
                header.set_offset_y(0.0);
                self.header = Some(header);
                self.shift_from(0, delta);
            }
            None => {
                self.header = Some(header);
                self.assemble(inter_item_spacing);
            }
        }
    }

    /// Replace the cell at `index` and shift every later element by the
    /// height delta. Returns `false` if `index` is out of range.
    pub fn set_and_assemble_item(&mut self, index: usize, item: Item) -> bool {
        let Some(slot) = self.items.get_mut(index) else {
            return false;
        };
        let offset_y = slot.offset_y();
        let delta = item.height() - slot.height();
        *slot = item;
        slot.set_offset_y(offset_y);
        self.shift_from(index + 1, delta);
        true
    }

    /// Replace the footer. Nothing follows it, so only the height changes.
    pub fn set_and_assemble_footer(&mut self, footer: Item, inter_item_spacing: f64) {
        match self.footer.as_ref() {
            Some(previous) => {
                let offset_y = previous.offset_y();
                let mut footer = footer;
                footer.set_offset_y(offset_y);
                self.footer = Some(footer);
                self.height = self.compute_height();
            }
            None => {
                self.footer = Some(footer);
                self.assemble(inter_item_spacing);
            }
        }
    }

    /// Move cells `from..` and the footer by `delta`, then refresh the height.
    fn shift_from(&mut self, from: usize, delta: f64) {
        if delta != 0.0 {
            for item in self.items.iter_mut().skip(from) {
                item.set_offset_y(item.offset_y() + delta);
            }
            if let Some(footer) = self.footer.as_mut() {
                footer.set_offset_y(footer.offset_y() + delta);
            }
        }
        self.height = self.compute_height();
    }

    /// Mutable access to an element for in-place edits that keep its height
    /// (alignment changes). Callers changing sizes must use the
    /// `set_and_assemble_*` mutators.
    pub(crate) fn element_mut(&mut self, kind: ItemKind, index: usize) -> Option<&mut Item> {
        match kind {
            ItemKind::Header if index == 0 => self.header.as_mut(),
            ItemKind::Footer if index == 0 => self.footer.as_mut(),
            ItemKind::Cell => self.items.get_mut(index),
            _ => None,
        }
    }

    /// Insert a cell. Leaves the section unassembled.
    pub(crate) fn insert_item(&mut self, index: usize, item: Item) {
        self.items.insert(index, item);
    }

    /// Drop every cell whose identity satisfies `remove`, returning them in
    /// their original order. Leaves the section unassembled.
    pub(crate) fn extract_items<F>(&mut self, remove: F) -> Vec<Item>
    where
        F: Fn(ItemId) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if remove(item.id()) {
                removed.push(item);
            } else {
                kept.push(item);
            }
        }
        self.items = kept;
        removed
    }

    /// Replace the whole content keeping the section identity.
    /// Leaves the section unassembled.
    pub(crate) fn replace_contents(&mut self, header: Option<Item>, items: Vec<Item>, footer: Option<Item>) {
        self.header = header;
        self.items = items;
        self.footer = footer;
    }

    /// Take the current content out, leaving the section empty.
    pub(crate) fn take_contents(&mut self) -> (Option<Item>, Vec<Item>, Option<Item>) {
        (
            self.header.take(),
            std::mem::take(&mut self.items),
            self.footer.take(),
        )
    }

    /// Reset every element's size. Each element touches only its own slot.
    pub(crate) fn reset_sizes(&mut self) {
        if let Some(header) = self.header.as_mut() {
            header.reset_size();
        }
        for item in &mut self.items {
            item.reset_size();
        }
        if let Some(footer) = self.footer.as_mut() {
            footer.reset_size();
        }
    }
}
