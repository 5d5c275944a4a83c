//! Host viewport: size, scroll position and system insets.

use serde::{Deserialize, Serialize};

use crate::model::{EdgeInsets, Point, Rect, Size};

/// What the host's scroll view currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Size of the scroll view's bounds.
    pub size: Size,
    /// Current scroll position.
    pub content_offset: Point,
    /// Insets the host reserves (safe area, input bar).
    pub adjusted_content_insets: EdgeInsets,
}

impl Viewport {
    /// Viewport of `size` scrolled to the top with no insets.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Same viewport scrolled to `y`.
    #[must_use]
    pub fn scrolled_to(self, y: f64) -> Self {
        Self {
            content_offset: Point::new(self.content_offset.x, y),
            ..self
        }
    }

    /// Same viewport with different insets.
    #[must_use]
    pub fn with_insets(self, adjusted_content_insets: EdgeInsets) -> Self {
        Self {
            adjusted_content_insets,
            ..self
        }
    }

    /// The content-space rectangle not hidden behind the insets.
    pub fn visible_bounds(&self) -> Rect {
        let insets = self.adjusted_content_insets;
        Rect::new(
            insets.left,
            self.content_offset.y + insets.top,
            self.size.width - insets.horizontal(),
            self.size.height - insets.vertical(),
        )
    }

    /// Horizontal band elements are aligned within.
    pub fn layout_frame(&self, additional_insets: EdgeInsets) -> Rect {
        let insets = self.adjusted_content_insets;
        Rect::new(
            insets.left + additional_insets.left,
            0.0,
            self.size.width - insets.horizontal() - additional_insets.horizontal(),
            0.0,
        )
    }

    /// Smallest and largest valid scroll offsets for `content_height`.
    pub fn content_offset_range(&self, content_height: f64) -> (f64, f64) {
        let insets = self.adjusted_content_insets;
        let min = -insets.top;
        let max = content_height + insets.bottom - self.size.height;
        (min, max.max(min))
    }

    /// True if only the scroll position differs.
    pub fn same_geometry(&self, other: &Viewport) -> bool {
        self.size == other.size && self.adjusted_content_insets == other.adjusted_content_insets
    }
}
