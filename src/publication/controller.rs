//! Publication state: geometry, divisions and the ordered page list

use crate::division::{DivisionLayoutManager, GroupingScope};
use crate::geometry::{PublicationGeometry, Units};
use crate::page::{DivisionSlot, Page, PageFrame, PageHandle};
use crate::stream::{DependentRef, SharedStream, StreamRegistry};
use crate::{LayoutError, Point, Rect, Size};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Subordinate objects deferred from a page to the next page of its division
pub(super) type Carry = SmallVec<[DependentRef; 4]>;

/// Owns the page list of a publication and keeps it consistent with the
/// content streams of its divisions
pub struct PublicationController {
    pub(super) geometry: PublicationGeometry,
    pub(super) units: Units,
    pub(super) divisions: Vec<DivisionLayoutManager>,
    pub(super) pages: Vec<Page>,
    pub(super) registry: StreamRegistry,
    /// Footnotes each page could not fit, keyed by the deferring page
    pub(super) carry_out: FxHashMap<PageHandle, Carry>,
    next_handle: u64,
    scroll_position: Point,
}

impl PublicationController {
    pub fn new(geometry: PublicationGeometry) -> Result<Self, LayoutError> {
        geometry.validate()?;
        Ok(Self {
            units: Units::new(geometry.printer_dpi, geometry.screen_dpi, 1.0),
            geometry,
            divisions: Vec::new(),
            pages: Vec::new(),
            registry: StreamRegistry::new(),
            carry_out: FxHashMap::default(),
            next_handle: 1,
            scroll_position: Point::default(),
        })
    }

    /// Append a division; returns its index
    pub fn add_division(&mut self, division: DivisionLayoutManager) -> usize {
        let index = self.divisions.len();
        for stream in division.streams() {
            self.registry.register(stream, index);
        }
        self.divisions.push(division);
        index
    }

    /// Attach a subordinate stream to a division already in the publication
    pub fn add_subordinate_stream(
        &mut self,
        division: usize,
        stream: SharedStream,
        scope: GroupingScope,
    ) -> Option<usize> {
        let manager = self.divisions.get_mut(division)?;
        self.registry.register(&stream, division);
        Some(manager.add_subordinate_stream(stream, scope))
    }

    pub fn geometry(&self) -> &PublicationGeometry {
        &self.geometry
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    pub fn divisions(&self) -> &[DivisionLayoutManager] {
        &self.divisions
    }

    pub fn division(&self, index: usize) -> Option<&DivisionLayoutManager> {
        self.divisions.get(index)
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    // Navigation

    pub fn find_page(&self, handle: PageHandle) -> Option<&Page> {
        self.pages.iter().find(|page| page.handle() == handle)
    }

    pub fn index_of_page(&self, handle: PageHandle) -> Option<usize> {
        self.pages.iter().position(|page| page.handle() == handle)
    }

    pub fn page_after(&self, handle: PageHandle) -> Option<&Page> {
        let index = self.index_of_page(handle)?;
        self.pages.get(index + 1)
    }

    /// Insert an estimate page for `division` right after `after`
    pub fn insert_page_after(&mut self, after: PageHandle, division: usize, offset: i32) -> Option<PageHandle> {
        if division >= self.divisions.len() {
            return None;
        }
        let index = self.index_of_page(after)?;
        let page = self.new_page(DivisionSlot::new(division, offset));
        let handle = page.handle();
        self.pages.insert(index + 1, page);
        self.refresh_pages();
        Some(handle)
    }

    /// Remove a page; its handle stops resolving
    pub fn delete_page(&mut self, handle: PageHandle) -> bool {
        match self.index_of_page(handle) {
            Some(index) => {
                self.remove_page_at(index);
                self.refresh_pages();
                true
            }
            None => false,
        }
    }

    // Screen geometry

    pub fn zoom(&self) -> f64 {
        self.units.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if !(zoom.is_finite() && zoom > 0.0) {
            log::warn!("ignoring zoom factor {zoom}");
            return;
        }
        self.units.zoom = zoom;
    }

    /// Zoom at which the page fills `available_width` screen pixels
    pub fn calculate_zoom_factor(&self, available_width: i32) -> f64 {
        if available_width <= 0 {
            return 1.0;
        }
        let page_inches = self.geometry.page_width as f64 / crate::MILLIPOINTS_PER_INCH as f64;
        let page_pixels = page_inches * self.geometry.screen_dpi.x as f64;
        if page_pixels <= 0.0 {
            return 1.0;
        }
        available_width as f64 / page_pixels
    }

    pub fn page_width_screen(&self) -> i32 {
        self.units.mp_to_screen_x(self.geometry.page_width)
    }

    pub fn page_height_screen(&self) -> i32 {
        self.units.mp_to_screen_y(self.geometry.page_height)
    }

    /// Distance between the tops of consecutive pages on screen
    pub fn page_pitch(&self) -> i32 {
        self.page_height_screen() + self.geometry.page_gap
    }

    /// Top of a page in screen coordinates of the unscrolled layout
    pub fn page_top(&self, index: usize) -> i32 {
        self.geometry.page_gap + index as i32 * self.page_pitch()
    }

    /// Page rectangle in screen coordinates of the unscrolled layout
    pub fn page_rect(&self, index: usize) -> Option<Rect> {
        (index < self.pages.len()).then(|| {
            Rect::new(
                self.geometry.page_gap,
                self.page_top(index),
                self.page_width_screen(),
                self.page_height_screen(),
            )
        })
    }

    /// Virtual extent of the whole publication on screen
    pub fn auto_scroll_min_size(&self) -> Size {
        let gap = self.geometry.page_gap;
        Size::new(
            self.page_width_screen() + 2 * gap,
            self.pages.len() as i32 * self.page_pitch() + gap,
        )
    }

    pub fn scroll_position(&self) -> Point {
        self.scroll_position
    }

    pub fn set_scroll_position(&mut self, position: Point) {
        self.scroll_position = position;
    }

    /// Tear down every distinct stream once and drop all pages
    pub fn dispose(&mut self) {
        for index in (0..self.pages.len()).rev() {
            self.remove_page_at(index);
        }
        let disposed = self.registry.dispose_all();
        if disposed > 0 {
            log::debug!("disposed {disposed} streams");
        }
    }

    // Internal page bookkeeping

    pub(super) fn page_width_px(&self) -> i32 {
        self.units.mp_to_printer_x(self.geometry.page_width)
    }

    pub(super) fn page_height_px(&self) -> i32 {
        self.units.mp_to_printer_y(self.geometry.page_height)
    }

    /// Printable area of a page, from its first division's margins
    pub fn page_frame(&self, index: usize) -> Option<PageFrame> {
        let page = self.pages.get(index)?;
        let page_height = self.page_height_px();
        Some(PageFrame {
            top: page.top_margin(),
            height: page_height - page.top_margin() - page.bottom_margin(),
            page_width: self.page_width_px(),
            page_height,
        })
    }

    pub(super) fn column_width(&self, division: usize) -> i32 {
        self.divisions[division].column_width(&self.geometry, &self.units)
    }

    /// Current height estimate of a division's main stream
    pub(super) fn division_height(&mut self, division: usize) -> i32 {
        let width = self.column_width(division);
        self.divisions[division].estimate_height(width)
    }

    pub(super) fn division_pages(&self, division: usize) -> SmallVec<[usize; 8]> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.contains_division(division))
            .map(|(index, _)| index)
            .collect()
    }

    pub(super) fn new_page(&mut self, slot: DivisionSlot) -> Page {
        let handle = PageHandle(self.next_handle);
        self.next_handle += 1;
        let division = &self.divisions[slot.division];
        Page::new(
            handle,
            slot,
            division.top_margin(&self.units),
            division.bottom_margin(&self.units),
        )
    }

    /// Insert a page after `index` showing `division` from `offset`, followed
    /// by the given later slots
    pub(super) fn insert_continuation(
        &mut self,
        index: usize,
        division: usize,
        offset: i32,
        later: SmallVec<[DivisionSlot; 2]>,
    ) -> PageHandle {
        let mut page = self.new_page(DivisionSlot::new(division, offset));
        for slot in later {
            page.add_slot(DivisionSlot::new(slot.division, 0));
        }
        let handle = page.handle();
        log::debug!("continuation page {:?} for division {division} at {offset}", handle);
        self.pages.insert(index + 1, page);
        handle
    }

    pub(super) fn carry_pending(&self, index: usize) -> bool {
        self.pages
            .get(index)
            .and_then(|page| self.carry_out.get(&page.handle()))
            .is_some_and(|carry| !carry.is_empty())
    }

    /// Tell every stream shown on the page to forget it, then remove it
    pub(super) fn remove_page_at(&mut self, index: usize) {
        let page = self.pages.remove(index);
        for slot in page.slots() {
            for stream in self.divisions[slot.division].streams() {
                stream.borrow_mut().page_discarded(page.handle());
            }
        }
        self.carry_out.remove(&page.handle());
        log::trace!("removed page {:?}", page.handle());
    }

    /// Drop a division's slot from a page, deleting the page once it is empty
    pub(super) fn remove_division_from_page(&mut self, index: usize, division: usize) {
        let handle = self.pages[index].handle();
        for stream in self.divisions[division].streams() {
            stream.borrow_mut().page_discarded(handle);
        }
        let page = &mut self.pages[index];
        page.remove_slot(division);
        if page.is_empty() {
            self.remove_page_at(index);
        } else {
            self.invalidate_page(index);
        }
    }

    /// Throw away real layout; the page goes back to estimates
    pub(super) fn invalidate_page(&mut self, index: usize) {
        let page = &mut self.pages[index];
        page.clear_elements();
        page.set_needs_layout(true);
    }

    /// Recompute page numbers and margins after the page list changed.
    /// Laid-out pages whose parity flipped move their elements to the new
    /// side margins.
    pub(super) fn refresh_pages(&mut self) {
        let mut previous: Option<usize> = None;
        let mut number = 0;
        for index in 0..self.pages.len() {
            let first = self.pages[index].first_division();
            number = if previous == Some(first) { number + 1 } else { 1 };
            previous = Some(first);

            let old_number = self.pages[index].page_number();
            let division = &self.divisions[first];
            let top = division.top_margin(&self.units);
            let bottom = division.bottom_margin(&self.units);

            let page = &mut self.pages[index];
            page.set_page_number(number);
            if page.top_margin() != top || page.bottom_margin() != bottom {
                page.set_margins(top, bottom);
                if !page.needs_layout() {
                    self.invalidate_page(index);
                }
                continue;
            }
            if page.needs_layout() || old_number == number {
                continue;
            }
            let slots: SmallVec<[DivisionSlot; 2]> = page.slots().iter().copied().collect();
            for slot in slots {
                let division = &self.divisions[slot.division];
                let dx = division.left_margin(number, &self.geometry, &self.units)
                    - division.left_margin(old_number, &self.geometry, &self.units);
                if dx != 0 {
                    self.pages[index].shift_elements(slot.division, dx);
                }
            }
        }
    }
}

impl Drop for PublicationController {
    fn drop(&mut self) {
        self.dispose();
    }
}
