//! Pixel geometry shared by the layout engine and the viewport controller.
//!
//! All coordinates are integer pixels in the continuous scroll space:
//! y grows downward from the top of the first page.

use std::fmt;

/// Width/height pair in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0, height: 0 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Half-open vertical extent `[start, end)` of a page in scroll coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn height(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// True if `[start, end)` overlaps `[top, top + height)`.
    ///
    /// Zero-height spans never overlap anything.
    pub fn overlaps(&self, top: u32, height: u32) -> bool {
        let bottom = top.saturating_add(height);
        self.end.min(bottom) > self.start.max(top)
    }

    /// True if the absolute row `y` falls inside this span.
    pub fn contains(&self, y: u32) -> bool {
        self.start <= y && y < self.end
    }
}
