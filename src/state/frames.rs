//! Frame resolution: model offsets plus viewport-dependent placement.

use super::attributes::LayoutAttributes;
use super::viewport::Viewport;
use crate::model::{Item, ItemKind, ItemPath, LayoutModel, Rect};

/// Turns section-local element geometry into absolute frames for one
/// snapshot under one viewport.
///
/// Horizontal alignment is resolved here, against the layout frame as it
/// is *now*, never stored in the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrameResolver {
    layout_frame: Rect,
    shift: f64,
}

impl FrameResolver {
    pub(crate) fn new(model: &LayoutModel, viewport: &Viewport) -> Self {
        let settings = model.settings();
        let visible_height = viewport.visible_bounds().height();
        let content_height = model.content_height();
        let shift = if settings.keep_content_at_bottom_of_visible_area && content_height < visible_height {
            visible_height - content_height
        } else {
            0.0
        };
        Self {
            layout_frame: viewport.layout_frame(settings.additional_insets),
            shift,
        }
    }

    /// Vertical shift applied to every frame to pin short content to the
    /// bottom of the visible area.
    pub(crate) fn shift(&self) -> f64 {
        self.shift
    }

    /// Absolute frame of `item`, whose section starts at `section_offset`.
    pub(crate) fn frame(&self, section_offset: f64, item: &Item) -> Rect {
        let size = item.effective_size();
        let (x, width) = item.alignment().resolve(size, &self.layout_frame);
        Rect::new(x, section_offset + item.offset_y() + self.shift, width, size.height)
    }

    pub(crate) fn attributes(
        &self,
        section_offset: f64,
        item: &Item,
        section: usize,
        index: usize,
    ) -> LayoutAttributes {
        let kind = item.kind();
        LayoutAttributes {
            id: item.id(),
            path: ItemPath::new(section, index),
            kind,
            frame: self.frame(section_offset, item),
            alignment: item.alignment(),
            z_index: kind.z_index(),
        }
    }

    /// Attributes of the element of `kind` at `path`.
    pub(crate) fn attributes_at(&self, model: &LayoutModel, path: ItemPath, kind: ItemKind) -> Option<LayoutAttributes> {
        let section_offset = model.section_offset(path.section)?;
        let item = model.element(path, kind)?;
        Some(self.attributes(section_offset, item, path.section, path.item))
    }
}
