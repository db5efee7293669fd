//! Pagewise: the pagination core of a print-preview surface
//!
//! This crate slices one or more content flows ("divisions") into pages:
//! - Estimated pages are created up front from cheap height estimates
//! - Pages are laid out for real only when they are about to be drawn
//! - Height corrections insert, delete and shift pages without moving the
//!   caller's scroll position
//! - Subordinate streams (footnotes) share page space with the main text
//!
//! Measuring and drawing content is left to a [`ContentStream`]
//! implementation supplied by the host.

pub mod division;
mod error;
pub mod geometry;
pub mod page;
pub mod publication;
pub mod render;
pub mod stream;

pub use error::LayoutError;

// Re-export primary types
pub use division::{DivisionLayoutManager, DivisionView, GroupingScope, SubordinateStream};
pub use geometry::{
    BindingEdge, DivisionSettings, Dpi, Margins, PublicationGeometry, Sides, StartAt, Units,
    MILLIPOINTS_PER_INCH,
};
pub use page::{Affinity, ContentLocation, Page, PageElement, PageHandle, PageSelection};
pub use publication::{ElementHit, PublicationController};
pub use render::{DisplayItem, DisplayList, DisplayPage};
pub use stream::{ContentStream, ObjectId, SharedStream, StreamId};

/// Device coordinates (printer or screen pixels, depending on context)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width and height in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Device rectangle; `right()` and `bottom()` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Overlapping area of two rectangles, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}
