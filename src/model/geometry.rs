//! Geometry primitives: points, sizes, insets and axis-aligned rectangles.
//!
//! All values are `f64` points. Constructors clamp negative extents to zero,
//! so a `Size` or `Rect` built through them never carries negative geometry.
//! Comparisons that drive invalidation or compensation decisions go through
//! [`rounded`] to avoid sub-pixel thrashing.

use serde::{Deserialize, Serialize};

/// Round a coordinate to the nearest whole point.
///
/// Used wherever two floating point edges are compared to decide whether
/// content moved, so that accumulated float error never flips a decision.
#[inline]
pub fn rounded(value: f64) -> f64 {
    value.round()
}

/// Compare two coordinates after rounding both to the nearest whole point.
#[inline]
pub fn rounded_eq(lhs: f64, rhs: f64) -> bool {
    rounded(lhs) == rounded(rhs)
}

/// Clamp a scalar extent (width, height, spacing) to be non-negative.
///
/// NaN collapses to zero as well.
#[inline]
pub fn non_negative(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A point in layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate, growing downwards.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair. Never negative when built through [`Size::new`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// The empty size.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Create a new size, clamping negative extents to zero.
    #[inline]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: non_negative(width),
            height: non_negative(height),
        }
    }

    /// Re-apply the non-negative clamp to a size that may have been built
    /// field by field (e.g. deserialized).
    #[inline]
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.width, self.height)
    }

    /// True if either extent is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Insets from each edge of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeInsets {
    /// Inset from the top edge.
    pub top: f64,
    /// Inset from the left edge.
    pub left: f64,
    /// Inset from the bottom edge.
    pub bottom: f64,
    /// Inset from the right edge.
    pub right: f64,
}

impl EdgeInsets {
    /// No insets.
    pub const ZERO: Self = Self {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    /// Create new insets.
    #[inline]
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Same inset on every edge.
    #[inline]
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Sum of left and right insets.
    #[inline]
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom insets.
    #[inline]
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// An axis-aligned rectangle: origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Extent.
    pub size: Size,
}

impl Rect {
    /// Zero-sized rectangle at the origin.
    pub const ZERO: Self = Self {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    /// Create a rectangle. Negative extents are clamped to zero.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Create a rectangle from an origin and a size.
    #[inline]
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self {
            origin,
            size: size.clamped(),
        }
    }

    /// Left edge.
    #[inline]
    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    /// Top edge.
    #[inline]
    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.size.width
    }

    /// Height.
    #[inline]
    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// Check if a point lies inside the rectangle (right/bottom edges exclusive).
    #[inline]
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    /// Check if `other` lies entirely within this rectangle.
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min_x() >= self.min_x()
            && other.max_x() <= self.max_x()
            && other.min_y() >= self.min_y()
            && other.max_y() <= self.max_y()
    }

    /// Check if this rectangle overlaps `other`.
    ///
    /// Rectangles that only touch along an edge do not intersect. A
    /// zero-extent side counts as overlapping when it lies inside the other
    /// rectangle's span, so collapsed elements stay visible.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        spans_overlap(self.min_x(), self.max_x(), other.min_x(), other.max_x())
            && spans_overlap(self.min_y(), self.max_y(), other.min_y(), other.max_y())
    }

    /// Shrink by `insets`. Collapses to zero extent rather than going negative.
    #[inline]
    #[must_use]
    pub fn inset_by(&self, insets: EdgeInsets) -> Self {
        Self::new(
            self.origin.x + insets.left,
            self.origin.y + insets.top,
            self.size.width - insets.horizontal(),
            self.size.height - insets.vertical(),
        )
    }

    /// Grow by `dx` on the left and right and `dy` on the top and bottom.
    #[inline]
    #[must_use]
    pub fn outset_by(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.origin.x - dx,
            self.origin.y - dy,
            self.size.width + dx * 2.0,
            self.size.height + dy * 2.0,
        )
    }

    /// Translate by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub fn offset_by(&self, dx: f64, dy: f64) -> Self {
        Self {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: self.size,
        }
    }
}

/// Half-open overlap of `[a_min, a_max)` and `[b_min, b_max)`, treating an
/// empty span as the point it sits on.
fn spans_overlap(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> bool {
    if a_min == a_max {
        return b_min <= a_min && (a_min < b_max || b_min == b_max);
    }
    if b_min == b_max {
        return a_min <= b_min && b_min < a_max;
    }
    a_min < b_max && b_min < a_max
}
