//! Per-element layout record.

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect, Size};
use super::identifiers::ItemId;

/// What role an element plays inside its section.
///
/// A section carries at most one header and one footer; cells repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Section header, laid out above the first cell.
    Header,
    /// Regular repeated element.
    Cell,
    /// Section footer, laid out below the last cell.
    Footer,
}

impl ItemKind {
    /// Rendering order hint. Supplementary elements draw above cells.
    pub fn z_index(&self) -> i32 {
        match self {
            ItemKind::Header | ItemKind::Footer => 10,
            ItemKind::Cell => 0,
        }
    }
}

/// Horizontal placement of an element inside the layout frame.
///
/// Resolved to an absolute x/width only at frame-query time, because it
/// depends on the container's current width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemAlignment {
    /// Pinned to the left edge of the layout frame.
    Leading,
    /// Pinned to the right edge of the layout frame.
    Trailing,
    /// Horizontally centred.
    Center,
    /// Stretched to the full layout frame width.
    #[default]
    FullWidth,
}

impl ItemAlignment {
    /// Resolve an element of `size` against a layout frame, returning its
    /// `(x, width)`. Widths wider than the frame are clipped to it.
    pub fn resolve(&self, size: Size, layout_frame: &Rect) -> (f64, f64) {
        let available = layout_frame.width();
        let width = size.width.min(available);
        match self {
            ItemAlignment::Leading => (layout_frame.min_x(), width),
            ItemAlignment::Trailing => (layout_frame.max_x() - width, width),
            ItemAlignment::Center => (layout_frame.min_x() + (available - width) / 2.0, width),
            ItemAlignment::FullWidth => (layout_frame.min_x(), available),
        }
    }
}

/// Size hint returned by the host for a newly created or reset element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSize {
    /// Use the settings' estimated item size until measured.
    #[default]
    Auto,
    /// A best guess; the host will report a measurement later.
    Estimated(Size),
    /// Known exactly; treated as already measured.
    Exact(Size),
}

/// Layout record for one header, cell or footer.
///
/// Owned by exactly one section. `offset_y` is section-local and only valid
/// right after the owning section was assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: ItemId,
    kind: ItemKind,
    alignment: ItemAlignment,
    preferred_size: Size,
    calculated_size: Option<Size>,
    offset_y: f64,
}

impl Item {
    /// Create an element with a fresh identity from a host size hint.
    pub fn new(kind: ItemKind, size: ItemSize, alignment: ItemAlignment, estimated: Size) -> Self {
        let (preferred_size, calculated_size) = match size {
            ItemSize::Auto => (estimated.clamped(), None),
            ItemSize::Estimated(size) => (size.clamped(), None),
            ItemSize::Exact(size) => (size.clamped(), Some(size.clamped())),
        };
        Self {
            id: ItemId::next(),
            kind,
            alignment,
            preferred_size,
            calculated_size,
            offset_y: 0.0,
        }
    }

    /// Stable identity.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Header, cell or footer.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Horizontal alignment.
    pub fn alignment(&self) -> ItemAlignment {
        self.alignment
    }

    /// Replace the alignment. Has no effect on vertical geometry.
    pub fn set_alignment(&mut self, alignment: ItemAlignment) {
        self.alignment = alignment;
    }

    /// Last known best-guess size.
    pub fn preferred_size(&self) -> Size {
        self.preferred_size
    }

    /// Exact measured size, if the host has reported one.
    pub fn calculated_size(&self) -> Option<Size> {
        self.calculated_size
    }

    /// Record an exact measurement.
    pub fn set_calculated_size(&mut self, size: Size) {
        self.calculated_size = Some(size.clamped());
    }

    /// Calculated size if measured, preferred size otherwise.
    pub fn effective_size(&self) -> Size {
        self.calculated_size.unwrap_or(self.preferred_size)
    }

    /// Effective height.
    pub fn height(&self) -> f64 {
        self.effective_size().height
    }

    /// Section-local vertical offset assigned by the last assembly.
    pub fn offset_y(&self) -> f64 {
        self.offset_y
    }

    pub(crate) fn set_offset_y(&mut self, offset_y: f64) {
        self.offset_y = offset_y;
    }

    /// Bottom edge in section-local coordinates.
    pub fn max_y(&self) -> f64 {
        self.offset_y + self.height()
    }

    /// Demote the measured size to the preferred size so the element is
    /// measured again while keeping its last-known size as the estimate.
    pub fn reset_size(&mut self) {
        if let Some(size) = self.calculated_size.take() {
            self.preferred_size = size;
        }
    }

    /// Section-local frame. Horizontal alignment is not applied here.
    pub fn frame(&self) -> Rect {
        Rect::from_origin_size(Point::new(0.0, self.offset_y), self.effective_size())
    }
}
