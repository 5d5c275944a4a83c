//! Host data source: counts plus per-element size and alignment hints.

use serde::{Deserialize, Serialize};

use crate::config::LayoutSettings;
use crate::model::{Item, ItemAlignment, ItemKind, ItemPath, ItemSize, LayoutModel, Section, Size};

/// What the engine asks the host about its content.
///
/// Always answers for the *current* data, which during a batch is the
/// after-update state. Passed by reference into every call that needs it;
/// the engine never keeps hold of it.
pub trait LayoutDataSource {
    /// Number of sections.
    fn number_of_sections(&self) -> usize;

    /// Number of cells in `section`.
    fn number_of_items(&self, section: usize) -> usize;

    /// Whether `section` presents a header.
    fn has_header(&self, section: usize) -> bool;

    /// Whether `section` presents a footer.
    fn has_footer(&self, section: usize) -> bool;

    /// Size hint and alignment for a freshly created or reset element.
    fn size_and_alignment(&self, kind: ItemKind, path: ItemPath) -> (ItemSize, ItemAlignment);
}

/// Create an element for `path` from the host's hints.
pub(crate) fn make_item<S>(source: &S, kind: ItemKind, path: ItemPath, settings: &LayoutSettings) -> Item
where
    S: LayoutDataSource + ?Sized,
{
    let (size, alignment) = source.size_and_alignment(kind, path);
    Item::new(kind, size, alignment, settings.estimated_item_size)
}

/// Create and assemble section `index` from the host's hints.
pub(crate) fn make_section<S>(source: &S, index: usize, settings: &LayoutSettings) -> Section
where
    S: LayoutDataSource + ?Sized,
{
    let (header, items, footer) = make_contents(source, index, settings);
    Section::new(header, items, footer, settings.inter_item_spacing)
}

/// Build a complete, assembled layout from the host's current data.
pub(crate) fn make_model<S>(source: &S, settings: &LayoutSettings) -> LayoutModel
where
    S: LayoutDataSource + ?Sized,
{
    let sections = (0..source.number_of_sections())
        .map(|index| make_section(source, index, settings))
        .collect();
    LayoutModel::new(sections, *settings)
}

/// Fresh header, cells and footer for section `index`.
pub(crate) fn make_contents<S>(
    source: &S,
    index: usize,
    settings: &LayoutSettings,
) -> (Option<Item>, Vec<Item>, Option<Item>)
where
    S: LayoutDataSource + ?Sized,
{
    let path = ItemPath::new(index, 0);
    let header = source
        .has_header(index)
        .then(|| make_item(source, ItemKind::Header, path, settings));
    let items = (0..source.number_of_items(index))
        .map(|item| make_item(source, ItemKind::Cell, ItemPath::new(index, item), settings))
        .collect();
    let footer = source
        .has_footer(index)
        .then(|| make_item(source, ItemKind::Footer, path, settings));
    (header, items, footer)
}

/// Size hint and alignment for one element of a [`SectionedDataSource`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSpec {
    /// Size hint.
    pub size: ItemSize,
    /// Horizontal alignment.
    pub alignment: ItemAlignment,
}

impl ElementSpec {
    /// Element with an estimated size.
    pub fn estimated(width: f64, height: f64) -> Self {
        Self {
            size: ItemSize::Estimated(Size::new(width, height)),
            alignment: ItemAlignment::FullWidth,
        }
    }

    /// Element with an exact size.
    pub fn exact(width: f64, height: f64) -> Self {
        Self {
            size: ItemSize::Exact(Size::new(width, height)),
            alignment: ItemAlignment::FullWidth,
        }
    }

    /// Same element with a different alignment.
    #[must_use]
    pub fn aligned(self, alignment: ItemAlignment) -> Self {
        Self { alignment, ..self }
    }
}

/// One section of a [`SectionedDataSource`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionSpec {
    /// Header, if any.
    pub header: Option<ElementSpec>,
    /// Cells.
    pub items: Vec<ElementSpec>,
    /// Footer, if any.
    pub footer: Option<ElementSpec>,
}

impl SectionSpec {
    /// `count` identical cells and no supplementary elements.
    pub fn uniform(count: usize, item: ElementSpec) -> Self {
        Self {
            header: None,
            items: vec![item; count],
            footer: None,
        }
    }

    /// Same section with a header and footer.
    #[must_use]
    pub fn with_supplementary(self, header: ElementSpec, footer: ElementSpec) -> Self {
        Self {
            header: Some(header),
            footer: Some(footer),
            ..self
        }
    }
}

/// In-memory data source for tests, benchmarks and script replay.
///
/// Mutate it to the after-update state first, then hand the matching
/// changes to the controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionedDataSource {
    sections: Vec<SectionSpec>,
}

impl SectionedDataSource {
    /// Create from section descriptions.
    pub fn new(sections: Vec<SectionSpec>) -> Self {
        Self { sections }
    }

    /// Sections in order.
    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    /// Insert a section at `index`. Returns `false` if out of range.
    pub fn insert_section(&mut self, index: usize, section: SectionSpec) -> bool {
        if index > self.sections.len() {
            return false;
        }
        self.sections.insert(index, section);
        true
    }

    /// Remove the section at `index`.
    pub fn remove_section(&mut self, index: usize) -> Option<SectionSpec> {
        (index < self.sections.len()).then(|| self.sections.remove(index))
    }

    /// Move a section. Returns `false` if either index is out of range.
    pub fn move_section(&mut self, from: usize, to: usize) -> bool {
        let Some(section) = self.remove_section(from) else {
            return false;
        };
        if to > self.sections.len() {
            self.sections.insert(from, section);
            return false;
        }
        self.sections.insert(to, section);
        true
    }

    /// Replace the section at `index`.
    pub fn replace_section(&mut self, index: usize, section: SectionSpec) -> bool {
        match self.sections.get_mut(index) {
            Some(slot) => {
                *slot = section;
                true
            }
            None => false,
        }
    }

    /// Insert a cell. Returns `false` if out of range.
    pub fn insert_item(&mut self, path: ItemPath, item: ElementSpec) -> bool {
        match self.sections.get_mut(path.section) {
            Some(section) if path.item <= section.items.len() => {
                section.items.insert(path.item, item);
                true
            }
            _ => false,
        }
    }

    /// Remove a cell.
    pub fn remove_item(&mut self, path: ItemPath) -> Option<ElementSpec> {
        let section = self.sections.get_mut(path.section)?;
        (path.item < section.items.len()).then(|| section.items.remove(path.item))
    }

    /// Move a cell. Returns `false` if either path is out of range.
    pub fn move_item(&mut self, from: ItemPath, to: ItemPath) -> bool {
        let Some(item) = self.remove_item(from) else {
            return false;
        };
        if self.insert_item(to, item) {
            return true;
        }
        // Restore the original position on failure
        self.insert_item(from, item);
        false
    }

    /// Replace a cell's description.
    pub fn replace_item(&mut self, path: ItemPath, item: ElementSpec) -> bool {
        match self
            .sections
            .get_mut(path.section)
            .and_then(|s| s.items.get_mut(path.item))
        {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    fn spec(&self, kind: ItemKind, path: ItemPath) -> Option<&ElementSpec> {
        let section = self.sections.get(path.section)?;
        match kind {
            ItemKind::Header => section.header.as_ref(),
            ItemKind::Footer => section.footer.as_ref(),
            ItemKind::Cell => section.items.get(path.item),
        }
    }
}

impl LayoutDataSource for SectionedDataSource {
    fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    fn number_of_items(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, |s| s.items.len())
    }

    fn has_header(&self, section: usize) -> bool {
        self.sections.get(section).is_some_and(|s| s.header.is_some())
    }

    fn has_footer(&self, section: usize) -> bool {
        self.sections.get(section).is_some_and(|s| s.footer.is_some())
    }

    fn size_and_alignment(&self, kind: ItemKind, path: ItemPath) -> (ItemSize, ItemAlignment) {
        match self.spec(kind, path) {
            Some(spec) => (spec.size, spec.alignment),
            None => {
                tracing::warn!(?kind, %path, "size requested for unknown element; using estimate");
                (ItemSize::Auto, ItemAlignment::default())
            }
        }
    }
}
