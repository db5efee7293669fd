//! Keeping the page list consistent as estimates turn into measurements

use super::controller::PublicationController;
use crate::page::{DivisionSlot, PageHandle};
use crate::stream::SharedStream;
use crate::Rect;
use smallvec::SmallVec;

impl PublicationController {
    /// A previously estimated region of `stream` starting at `position`
    /// changed height by `delta`.
    ///
    /// Pages of every division showing the stream after `position` move by
    /// `delta`; pages are then inserted or removed at the division tail.
    /// The scroll position is left alone.
    pub fn adjust_scroll_range(&mut self, stream: &SharedStream, position: i32, delta: i32) {
        if delta == 0 {
            return;
        }
        log::debug!("{:?} changed by {delta} at {position}", stream);

        let mut corrected: SmallVec<[usize; 4]> = SmallVec::new();
        for division in 0..self.divisions.len() {
            let manager = &self.divisions[division];
            if manager.main_stream() == stream {
                let width = self.column_width(division);
                self.divisions[division].note_height_change(width, delta);
                self.shift_main_offsets(division, position, delta);
                corrected.push(division);
            } else if manager.subordinates().iter().any(|sub| &sub.stream == stream) {
                self.adjust_subordinate(division, stream, position, delta);
            }
        }

        for division in corrected {
            self.repair_chain(division);
        }
        self.refresh_pages();
    }

    fn shift_main_offsets(&mut self, division: usize, position: i32, delta: i32) {
        for page in &mut self.pages {
            // The page showing the change keeps its layout, columns included
            let Some(offset) = page.offset_from_top_of_div(division) else {
                continue;
            };
            if offset <= position {
                continue;
            }
            page.set_offset(division, offset + delta);
            for element in page.elements_mut() {
                if element.division() == division && element.is_main_stream() {
                    let top = element.offset_to_top_page_boundary();
                    *element = element.with_offset(top + delta);
                }
            }
        }
    }

    /// Footnote growth: replace the element showing `position`, keeping it
    /// anchored to the bottom of the page. The main-stream offset of the page
    /// does not change.
    fn adjust_subordinate(&mut self, division: usize, stream: &SharedStream, position: i32, delta: i32) {
        for index in 0..self.pages.len() {
            if !self.pages[index].contains_division(division) {
                continue;
            }
            let Some(frame) = self.page_frame(index) else {
                continue;
            };
            let page = &mut self.pages[index];
            let mut replaced = false;
            for element in page.elements_mut() {
                if element.division() != division || element.is_main_stream() || element.stream() != stream {
                    continue;
                }
                let (top, _) = element.stream_range();
                if element.shows_stream_position(position) {
                    let location = element.location();
                    let height = (location.height + delta).max(0);
                    *element = element.relocated(Rect::new(
                        location.x,
                        location.bottom() - height,
                        location.width,
                        height,
                    ));
                    replaced = true;
                } else if top > position {
                    *element = element.with_offset(top + delta);
                }
            }
            if replaced {
                let (free_top, free_bottom) = page.free_space(frame);
                if free_bottom < free_top {
                    log::debug!("footnotes overflow page {index}");
                    page.set_needs_layout(true);
                }
            }
        }
    }

    /// Make the page after `handle` start where the layout of `division`
    /// on it stopped
    pub(super) fn reconcile_break(
        &mut self,
        handle: PageHandle,
        division: usize,
        next_start: i32,
        carry_changed: bool,
    ) {
        let mut steps = 0;
        loop {
            steps += 1;
            if steps > self.pages.len() + 16 {
                log::warn!("division {division}: break after {:?} did not settle", handle);
                break;
            }
            let Some(index) = self.index_of_page(handle) else {
                return;
            };
            let height = self.division_height(division);
            let carry = self.carry_pending(index);
            let next = index + 1;
            let has_next = self
                .pages
                .get(next)
                .is_some_and(|page| page.contains_division(division));

            if !has_next {
                if next_start < height || carry {
                    let later = self.pages[index].split_off_slots_after(division);
                    self.insert_continuation(index, division, next_start, later);
                }
                break;
            }

            let next_is_last = !self
                .pages
                .get(next + 1)
                .is_some_and(|page| page.contains_division(division));
            let next_end = if next_is_last {
                height
            } else {
                self.slot_offset(next + 1, division)
            };
            // Everything the next page would show is already on this one
            if next_start >= next_end && !(next_is_last && carry) {
                self.remove_division_from_page(next, division);
                continue;
            }
            if self.slot_offset(next, division) != next_start || carry_changed {
                self.pages[next].set_offset(division, next_start);
                self.invalidate_page(next);
            }
            break;
        }
        self.refresh_pages();
        self.repair_chain(division);
    }

    /// Repair a division and then every division sharing its last page
    pub(super) fn repair_chain(&mut self, division: usize) {
        let mut current = division;
        loop {
            self.fix_page_count(current);
            let Some(&last) = self.division_pages(current).last() else {
                break;
            };
            let next = self.pages[last]
                .slots()
                .iter()
                .map(|slot| slot.division)
                .find(|other| *other > current);
            match next {
                Some(other) => current = other,
                None => break,
            }
        }
        self.refresh_pages();
    }

    /// Insert or remove pages until the division's pages cover its content
    /// exactly once
    pub(super) fn fix_page_count(&mut self, division: usize) {
        let mut steps = 0;
        while self.repair_step(division) {
            steps += 1;
            if steps > self.pages.len() * 2 + 64 {
                log::warn!("division {division}: page count did not settle");
                break;
            }
        }
    }

    /// One structural repair; returns false once nothing needed changing
    fn repair_step(&mut self, division: usize) -> bool {
        let height = self.division_height(division);
        let pages = self.division_pages(division);
        let Some(&first) = pages.first() else {
            if height > 0 {
                self.insert_first_page(division);
                return true;
            }
            return false;
        };

        if height <= 0 && !pages.iter().any(|index| self.carry_pending(*index)) {
            log::debug!("division {division} no longer has content");
            for index in pages.iter().rev() {
                self.remove_division_from_page(*index, division);
            }
            return true;
        }

        // Consecutive pages must move forward through the content
        for pair in pages.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let offset_a = self.slot_offset(a, division);
            let offset_b = self.slot_offset(b, division);
            let stale = offset_b < offset_a
                || (offset_b == offset_a && self.advances(a, division))
                || (offset_b >= height && !self.carry_pending(a));
            if stale {
                self.remove_division_from_page(b, division);
                return true;
            }
            // A laid-out page already shows the start of `b`
            if !self.pages[a].needs_layout() {
                if let Some(end) = self.laid_out_end(a, division) {
                    if end > offset_b {
                        self.pages[b].set_offset(division, end);
                        self.invalidate_page(b);
                        return true;
                    }
                }
            }
            // Content pushed past the end of `a` gets a page of its own
            if let Some(end) = self.page_end(a, division) {
                if end < offset_b {
                    self.insert_continuation(a, division, end, SmallVec::new());
                    self.refresh_pages();
                    return true;
                }
            }
        }

        // A later slot without room starts a page of its own
        let position = self.slot_position(first, division);
        if position > 0 && self.slot_capacity(first, position) <= 0 {
            self.move_slots_to_new_page(first, position);
            return true;
        }

        // The tail must fit on the last page
        let last = pages[pages.len() - 1];
        let Some(end) = self.page_end(last, division) else {
            // No room between the margins: everything stays on one page
            return false;
        };
        if end < height {
            let later = self.pages[last].split_off_slots_after(division);
            self.insert_continuation(last, division, end, later);
            self.refresh_pages();
            return true;
        }
        false
    }

    /// First page for a division that had none
    fn insert_first_page(&mut self, division: usize) {
        let index = self.pages.partition_point(|page| page.first_division() < division);
        let later = match index.checked_sub(1) {
            Some(previous) if self.pages[previous].last_division() > division => {
                self.pages[previous].split_off_slots_after(division)
            }
            _ => SmallVec::new(),
        };
        let mut page = self.new_page(DivisionSlot::new(division, 0));
        for slot in later {
            page.add_slot(DivisionSlot::new(slot.division, 0));
        }
        log::debug!("division {division} gets its first page at {index}");
        self.pages.insert(index, page);
        self.refresh_pages();
    }

    fn slot_offset(&self, index: usize, division: usize) -> i32 {
        self.pages[index].offset_from_top_of_div(division).unwrap_or(0)
    }

    fn slot_position(&self, index: usize, division: usize) -> usize {
        self.pages[index]
            .slots()
            .iter()
            .position(|slot| slot.division == division)
            .unwrap_or(0)
    }

    /// Whether the page shows (or is expected to show) main content of the
    /// division
    fn advances(&self, index: usize, division: usize) -> bool {
        let page = &self.pages[index];
        page.needs_layout()
            || page
                .elements()
                .iter()
                .any(|element| element.division() == division && element.is_main_stream())
    }

    /// Where the division's content on the page ends: measured on laid-out
    /// pages, `offset + capacity` on estimate pages. `None` when an estimate
    /// page has no room at all.
    fn page_end(&mut self, index: usize, division: usize) -> Option<i32> {
        let offset = self.slot_offset(index, division);
        if !self.pages[index].needs_layout() {
            return Some(self.laid_out_end(index, division).unwrap_or(offset));
        }
        let capacity = self.slot_capacity(index, self.slot_position(index, division));
        (capacity > 0).then_some(offset + capacity)
    }

    /// Stream position right after the last main content the laid-out page
    /// shows for the division
    fn laid_out_end(&self, index: usize, division: usize) -> Option<i32> {
        self.pages[index]
            .elements()
            .iter()
            .filter(|element| element.division() == division && element.is_main_stream())
            .map(|element| element.stream_range().1)
            .max()
    }
}
