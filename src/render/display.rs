//! Display list: what a host has to paint for the visible pages

use crate::division::PageContext;
use crate::page::{Page, PageHandle};
use crate::publication::PublicationController;
use crate::stream::StreamId;
use crate::{Point, Rect};

/// A display item to render. Rectangles and points are in window
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    /// Content of one page element; the host draws `stream` starting at
    /// `offset` into `rect`
    Element {
        rect: Rect,
        stream: StreamId,
        offset: i32,
        division: usize,
        main: bool,
    },
    /// Printable area of a page that has not been laid out yet
    Placeholder { rect: Rect },
    /// Running header text, drawn in the top margin
    Header { position: Point, text: String },
    /// Footer text, drawn in the bottom margin
    Footer { position: Point, text: String },
}

impl DisplayItem {
    /// Get the rectangle of this item, if it has one
    pub fn rect(&self) -> Option<Rect> {
        match self {
            DisplayItem::Element { rect, .. } | DisplayItem::Placeholder { rect } => Some(*rect),
            _ => None,
        }
    }
}

/// Display list for a single page
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPage {
    pub page_index: usize,
    pub handle: PageHandle,
    pub page_number: usize,
    /// Page rectangle in window coordinates
    pub bounds: Rect,
    pub items: Vec<DisplayItem>,
}

/// Complete display list for rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub pages: Vec<DisplayPage>,
}

impl DisplayList {
    /// Build the display list for the pages intersecting `viewport`, given in
    /// screen coordinates of the unscrolled layout (its origin is the scroll
    /// position). Pages are not laid out here; call
    /// [`PublicationController::prepare_to_draw_pages`] first.
    pub fn build(controller: &PublicationController, viewport: Rect) -> Self {
        let mut pages = Vec::new();
        if viewport.is_empty() {
            return Self { pages };
        }

        for (index, page) in controller.pages().iter().enumerate() {
            let Some(rect) = controller.page_rect(index) else {
                break;
            };
            if rect.y >= viewport.bottom() {
                break;
            }
            if !rect.intersects(&viewport) {
                continue;
            }
            let bounds = rect.translated(-viewport.x, -viewport.y);
            pages.push(Self::build_page(controller, index, page, bounds));
        }

        DisplayList { pages }
    }

    fn build_page(controller: &PublicationController, index: usize, page: &Page, bounds: Rect) -> DisplayPage {
        let units = controller.units();
        let to_window = |rect: Rect| units.printer_to_screen_rect(rect).translated(bounds.x, bounds.y);
        let mut items = Vec::new();

        let division = page.first_division();
        let manager = controller.division(division);
        let context = PageContext {
            division,
            page_number: page.page_number(),
            page_index: index,
            division_page_count: controller
                .pages()
                .iter()
                .filter(|other| other.first_division() == division)
                .count(),
        };
        let left = manager
            .map(|manager| manager.left_margin(page.page_number(), controller.geometry(), units))
            .unwrap_or(0);

        if let Some(text) = manager.and_then(|manager| manager.view().header(&context)) {
            let y = page.top_margin() / 2;
            items.push(DisplayItem::Header {
                position: Self::to_window_point(controller, bounds, left, y),
                text,
            });
        }

        if page.needs_layout() {
            if let Some(frame) = controller.page_frame(index) {
                let printable = Rect::new(0, frame.top, frame.page_width, frame.height);
                items.push(DisplayItem::Placeholder {
                    rect: to_window(printable),
                });
            }
        } else {
            for element in page.elements() {
                items.push(DisplayItem::Element {
                    rect: to_window(element.location()),
                    stream: element.stream().id(),
                    offset: element.offset_to_top_page_boundary(),
                    division: element.division(),
                    main: element.is_main_stream(),
                });
            }
        }

        if let Some(text) = manager.and_then(|manager| manager.view().footer(&context)) {
            if let Some(frame) = controller.page_frame(index) {
                let y = frame.page_height - page.bottom_margin() / 2;
                items.push(DisplayItem::Footer {
                    position: Self::to_window_point(controller, bounds, left, y),
                    text,
                });
            }
        }

        DisplayPage {
            page_index: index,
            handle: page.handle(),
            page_number: page.page_number(),
            bounds,
            items,
        }
    }

    fn to_window_point(controller: &PublicationController, bounds: Rect, x: i32, y: i32) -> Point {
        let units = controller.units();
        Point::new(
            units.printer_to_screen_x(x) + bounds.x,
            units.printer_to_screen_y(y) + bounds.y,
        )
    }

    /// Total number of items across all pages
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }
}
