//! Placement of one stream (or one column of it) on one page

use crate::stream::SharedStream;
use crate::{Point, Rect};

/// Column placement details of a main-stream element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    /// 1-based column index
    pub column: usize,
    pub total_columns: usize,
    /// Gap between columns in printer pixels
    pub gap: i32,
    /// Height available to the column in printer pixels
    pub height: i32,
}

impl ColumnInfo {
    pub fn single(height: i32) -> Self {
        Self {
            column: 1,
            total_columns: 1,
            gap: 0,
            height,
        }
    }
}

/// Immutable placement record. Corrections replace elements rather than
/// mutating them.
#[derive(Debug, Clone, PartialEq)]
pub struct PageElement {
    division: usize,
    stream: SharedStream,
    /// Page-relative rectangle in printer pixels
    location: Rect,
    /// Stream position shown at the top of `location`
    offset_to_top_page_boundary: i32,
    is_main_stream: bool,
    column: ColumnInfo,
    right_to_left: bool,
    reduces_free_space_from_top: bool,
}

impl PageElement {
    /// Element showing one column of a division's main stream
    pub fn main(
        division: usize,
        stream: SharedStream,
        location: Rect,
        offset: i32,
        column: ColumnInfo,
        right_to_left: bool,
    ) -> Self {
        Self {
            division,
            stream,
            location,
            offset_to_top_page_boundary: offset,
            is_main_stream: true,
            column,
            right_to_left,
            reduces_free_space_from_top: true,
        }
    }

    /// Element showing a slice of a subordinate stream (footnotes)
    pub fn subordinate(
        division: usize,
        stream: SharedStream,
        location: Rect,
        offset: i32,
        reduces_free_space_from_top: bool,
    ) -> Self {
        Self {
            division,
            stream,
            location,
            offset_to_top_page_boundary: offset,
            is_main_stream: false,
            column: ColumnInfo::single(location.height),
            right_to_left: false,
            reduces_free_space_from_top,
        }
    }

    pub fn division(&self) -> usize {
        self.division
    }

    pub fn stream(&self) -> &SharedStream {
        &self.stream
    }

    pub fn location(&self) -> Rect {
        self.location
    }

    pub fn offset_to_top_page_boundary(&self) -> i32 {
        self.offset_to_top_page_boundary
    }

    pub fn is_main_stream(&self) -> bool {
        self.is_main_stream
    }

    pub fn current_column(&self) -> usize {
        self.column.column
    }

    pub fn total_columns(&self) -> usize {
        self.column.total_columns
    }

    pub fn column_gap(&self) -> i32 {
        self.column.gap
    }

    pub fn column_height(&self) -> i32 {
        self.column.height
    }

    pub fn is_right_to_left(&self) -> bool {
        self.right_to_left
    }

    pub fn reduces_free_space_from_top(&self) -> bool {
        self.reduces_free_space_from_top
    }

    /// Stream range `[top, bottom)` shown by this element
    pub fn stream_range(&self) -> (i32, i32) {
        let top = self.offset_to_top_page_boundary;
        (top, top + self.location.height)
    }

    pub fn shows_stream_position(&self, position: i32) -> bool {
        let (top, bottom) = self.stream_range();
        position >= top && position < bottom
    }

    /// Convert a page-relative point into stream coordinates
    pub fn to_stream_point(&self, page_point: Point) -> Point {
        Point::new(
            page_point.x - self.location.x,
            page_point.y - self.location.y + self.offset_to_top_page_boundary,
        )
    }

    /// Page-relative y of a stream position shown by this element
    pub fn to_page_y(&self, stream_y: i32) -> i32 {
        self.location.y + stream_y - self.offset_to_top_page_boundary
    }

    /// Copy of this element at a new page position
    pub fn relocated(&self, location: Rect) -> Self {
        Self {
            location,
            ..self.clone()
        }
    }

    /// Copy of this element showing content from a new stream offset
    pub fn with_offset(&self, offset: i32) -> Self {
        Self {
            offset_to_top_page_boundary: offset,
            ..self.clone()
        }
    }
}
