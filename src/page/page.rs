//! One page: the divisions it shows and where their content is placed

use crate::page::{Affinity, PageElement, PageSelection};
use smallvec::SmallVec;

/// Opaque page identity shared with content streams; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageHandle(pub u64);

/// Start of one division's content on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionSlot {
    pub division: usize,
    /// Offset from the top of the division's main stream
    pub offset: i32,
}

impl DivisionSlot {
    pub fn new(division: usize, offset: i32) -> Self {
        Self { division, offset }
    }
}

/// Printable area of a page in printer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFrame {
    /// Top of the printable area (the top margin)
    pub top: i32,
    /// Height available between the margins
    pub height: i32,
    pub page_width: i32,
    pub page_height: i32,
}

impl PageFrame {
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    handle: PageHandle,
    /// 1-based, restarting for each division
    page_number: usize,
    /// Divisions shown, in division order. Only the first may start
    /// partway into its content; the others start at offset 0.
    slots: SmallVec<[DivisionSlot; 2]>,
    /// Margins in printer pixels, taken from the first division
    top_margin: i32,
    bottom_margin: i32,
    /// Elements in reading order
    elements: Vec<PageElement>,
    needs_layout: bool,
}

impl Page {
    pub(crate) fn new(handle: PageHandle, slot: DivisionSlot, top_margin: i32, bottom_margin: i32) -> Self {
        let mut slots = SmallVec::new();
        slots.push(slot);
        Self {
            handle,
            page_number: 1,
            slots,
            top_margin,
            bottom_margin,
            elements: Vec::new(),
            needs_layout: true,
        }
    }

    pub fn handle(&self) -> PageHandle {
        self.handle
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub(crate) fn set_page_number(&mut self, page_number: usize) {
        self.page_number = page_number;
    }

    /// Index of the first division appearing on this page
    pub fn first_division(&self) -> usize {
        self.slots.first().map(|slot| slot.division).unwrap_or(0)
    }

    pub fn last_division(&self) -> usize {
        self.slots.last().map(|slot| slot.division).unwrap_or(0)
    }

    pub fn slots(&self) -> &[DivisionSlot] {
        &self.slots
    }

    pub fn contains_division(&self, division: usize) -> bool {
        self.slots.iter().any(|slot| slot.division == division)
    }

    /// Where this page starts within the division's content; `None` if the
    /// division has no content on this page
    pub fn offset_from_top_of_div(&self, division: usize) -> Option<i32> {
        self.slots
            .iter()
            .find(|slot| slot.division == division)
            .map(|slot| slot.offset)
    }

    pub(crate) fn set_offset(&mut self, division: usize, offset: i32) -> bool {
        match self.slots.iter_mut().find(|slot| slot.division == division) {
            Some(slot) => {
                slot.offset = offset;
                true
            }
            None => false,
        }
    }

    pub(crate) fn add_slot(&mut self, slot: DivisionSlot) {
        let index = self.slots.partition_point(|other| other.division < slot.division);
        self.slots.insert(index, slot);
    }

    /// Drop a division from the page along with its elements
    pub(crate) fn remove_slot(&mut self, division: usize) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.division != division);
        self.elements.retain(|element| element.division() != division);
        self.slots.len() != before
    }

    /// Detach the slots of divisions after `division`
    pub(crate) fn split_off_slots_after(&mut self, division: usize) -> SmallVec<[DivisionSlot; 2]> {
        let index = self.slots.partition_point(|slot| slot.division <= division);
        let moved: SmallVec<[DivisionSlot; 2]> = self.slots.drain(index..).collect();
        self.elements
            .retain(|element| !moved.iter().any(|slot| slot.division == element.division()));
        moved
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn top_margin(&self) -> i32 {
        self.top_margin
    }

    pub fn bottom_margin(&self) -> i32 {
        self.bottom_margin
    }

    pub(crate) fn set_margins(&mut self, top: i32, bottom: i32) {
        self.top_margin = top;
        self.bottom_margin = bottom;
    }

    /// Whether the page geometry is still estimate-derived
    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    pub(crate) fn set_needs_layout(&mut self, needs_layout: bool) {
        self.needs_layout = needs_layout;
    }

    pub fn elements(&self) -> &[PageElement] {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut Vec<PageElement> {
        &mut self.elements
    }

    pub(crate) fn clear_elements(&mut self) {
        self.elements.clear();
    }

    fn slot_position(&self, division: usize) -> usize {
        self.slots
            .iter()
            .position(|slot| slot.division == division)
            .unwrap_or(usize::MAX)
    }

    fn reading_key(&self, element: &PageElement) -> (usize, bool, i32) {
        let x = element.location().x;
        let horizontal = if element.is_right_to_left() { -x } else { x };
        (
            self.slot_position(element.division()),
            !element.is_main_stream(),
            horizontal,
        )
    }

    /// Insert an element keeping reading order: divisions in page order,
    /// main before subordinate, columns left-to-right (right-to-left for RTL)
    pub fn add_page_element(&mut self, element: PageElement) -> usize {
        let key = self.reading_key(&element);
        let index = self
            .elements
            .partition_point(|other| self.reading_key(other) <= key);
        self.elements.insert(index, element);
        index
    }

    /// Main-stream element that comes last in reading order for the division,
    /// with the right edge new content continues from (0 for RTL)
    pub fn get_last_element(&self, division: usize) -> Option<(&PageElement, i32)> {
        let mut main = self
            .elements
            .iter()
            .filter(|element| element.division() == division && element.is_main_stream());
        let first = main.next()?;
        if first.is_right_to_left() {
            let last = main.fold(first, |best, element| {
                if element.location().x < best.location().x {
                    element
                } else {
                    best
                }
            });
            Some((last, 0))
        } else {
            let last = main.fold(first, |best, element| {
                if element.location().right() > best.location().right() {
                    element
                } else {
                    best
                }
            });
            Some((last, last.location().right()))
        }
    }

    /// Insertion point at the first content shown on the page
    pub fn top_of_page_selection(&self) -> Option<PageSelection> {
        let division = self.slots.first()?.division;
        let first = self
            .elements
            .iter()
            .filter(|element| element.division() == division && element.is_main_stream())
            .min_by_key(|element| element.offset_to_top_page_boundary())?;
        let location = first
            .stream()
            .borrow()
            .location_at(first.offset_to_top_page_boundary(), Affinity::Downstream)?;
        Some(PageSelection::collapsed(location, Affinity::Downstream))
    }

    /// Insertion point after the last content shown on the page
    pub fn bottom_of_page_selection(&self) -> Option<PageSelection> {
        let division = self.slots.last()?.division;
        let last = self
            .elements
            .iter()
            .filter(|element| element.division() == division && element.is_main_stream())
            .max_by_key(|element| element.stream_range().1)?;
        let (_, bottom) = last.stream_range();
        let location = last.stream().borrow().location_at(bottom, Affinity::Upstream)?;
        Some(PageSelection::collapsed(location, Affinity::Upstream))
    }

    /// Vertical band `[top, bottom)` not claimed by top-anchored or
    /// bottom-anchored elements
    pub fn free_space(&self, frame: PageFrame) -> (i32, i32) {
        let mut top = frame.top;
        let mut bottom = frame.bottom();
        for element in &self.elements {
            let location = element.location();
            if element.reduces_free_space_from_top() {
                top = top.max(location.bottom());
            } else {
                bottom = bottom.min(location.y);
            }
        }
        (top, bottom)
    }

    /// Shift one division's elements sideways (page parity changed)
    pub(crate) fn shift_elements(&mut self, division: usize, dx: i32) {
        for element in &mut self.elements {
            if element.division() == division {
                *element = element.relocated(element.location().translated(dx, 0));
            }
        }
    }
}
