//! Estimate pages up front, real layout on demand

use super::controller::{Carry, PublicationController};
use crate::division::{ColumnSlice, DivisionLayoutManager, GroupingScope};
use crate::geometry::StartAt;
use crate::page::{DivisionSlot, Page, PageFrame, PageHandle};
use crate::stream::{DependentRef, ObjectId, PageRequest};
use smallvec::{smallvec, SmallVec};

/// Attempts at shrinking the main text to make room for footnotes
const MAX_NOTE_PASSES: usize = 3;

/// Rounds of estimate replacement for one page before giving up
const MAX_EXPANSION_PASSES: usize = 32;

/// Where and how much of a division's main stream to place on a page
#[derive(Debug, Clone, Copy)]
struct ColumnRun {
    start: i32,
    top: i32,
    height: i32,
    left_margin: i32,
    column_width: i32,
    column_gap: i32,
    force_progress: bool,
}

/// Main text placed by one [`ColumnRun`]
#[derive(Debug, Clone, Copy)]
struct PlacedText {
    start: i32,
    next_start: i32,
    /// Height of the tallest column
    used_height: i32,
}

/// Fill the columns of one division on a page, one `layout_page` per column
fn lay_out_columns(
    division: &DivisionLayoutManager,
    index: usize,
    page: &mut Page,
    run: ColumnRun,
) -> PlacedText {
    let columns = division.columns();
    let mut placed = PlacedText {
        start: run.start,
        next_start: run.start,
        used_height: 0,
    };
    let mut start = run.start;

    for column in 1..=columns {
        let request = PageRequest {
            width: run.column_width,
            available_height: run.height.max(0),
            start,
            handle: page.handle(),
            column,
            total_columns: columns,
            force_progress: run.force_progress && column == 1,
        };
        let result = division.main_stream().borrow_mut().layout_page(&request);
        if result.next_start < result.start || result.used_height < 0 {
            log::warn!("division {index}: stream went backwards from {start}");
            break;
        }
        if column == 1 {
            placed.start = result.start;
        }
        if result.used_height == 0 {
            break;
        }

        let slice = ColumnSlice {
            column,
            total_columns: columns,
            used_height: result.used_height,
            offset: result.start,
            column_height: run.height,
        };
        division.add_element(
            index,
            page,
            slice,
            run.left_margin,
            run.top,
            run.column_width,
            run.column_gap,
        );
        placed.used_height = placed.used_height.max(result.used_height);
        placed.next_start = result.next_start;
        start = result.next_start;
    }
    placed
}

/// Group references into placement batches per subordinate stream
fn batches(refs: &[DependentRef], division: &DivisionLayoutManager) -> Vec<(usize, SmallVec<[ObjectId; 4]>)> {
    let mut batches = Vec::new();
    for (subordinate, stream) in division.subordinates().iter().enumerate() {
        let mut ids: SmallVec<[ObjectId; 4]> = SmallVec::new();
        for reference in refs.iter().filter(|r| r.subordinate == subordinate) {
            if !ids.contains(&reference.object) {
                ids.push(reference.object);
            }
        }
        if ids.is_empty() {
            continue;
        }
        match stream.scope {
            GroupingScope::Page => batches.push((subordinate, ids)),
            GroupingScope::Object => batches.extend(ids.into_iter().map(|id| (subordinate, smallvec![id]))),
        }
    }
    batches
}

impl PublicationController {
    /// Replace the page list with estimate pages built from height
    /// estimates alone
    pub fn create_pages(&mut self) {
        for index in (0..self.pages.len()).rev() {
            self.remove_page_at(index);
        }
        self.carry_out.clear();

        // Footnotes of two divisions never share a page
        let sharing = !self
            .divisions
            .iter()
            .any(DivisionLayoutManager::has_subordinate_streams);
        let page_height = self.page_height_px();

        for division in 0..self.divisions.len() {
            let height = self.division_height(division);
            if height <= 0 {
                log::debug!("division {division} has no content");
                continue;
            }
            let manager = &self.divisions[division];
            let columns = manager.columns() as i32;
            let continuous = manager.start_at() == StartAt::Continuous;
            let available = page_height - manager.top_margin(&self.units) - manager.bottom_margin(&self.units);

            let mut offset = 0;
            let mut shared = false;
            if sharing && continuous && !self.pages.is_empty() {
                let last = self.pages.len() - 1;
                let room = self.room_on_page(last);
                if room > 0 {
                    self.pages[last].add_slot(DivisionSlot::new(division, 0));
                    offset = columns * room;
                    shared = true;
                }
            }

            if available <= 0 {
                log::warn!("division {division}: no room between margins ({available}px)");
                if !shared {
                    let page = self.new_page(DivisionSlot::new(division, 0));
                    self.pages.push(page);
                }
                continue;
            }
            let capacity = columns * available;
            while offset < height {
                let page = self.new_page(DivisionSlot::new(division, offset));
                self.pages.push(page);
                offset += capacity;
            }
        }

        self.refresh_pages();
        log::debug!("created {} estimate pages", self.pages.len());
    }

    /// Lay out the pages overlapping `[top, bottom]` (screen coordinates of
    /// the unscrolled layout) and return them in order
    pub fn prepare_to_draw_pages(&mut self, top: i32, bottom: i32) -> Vec<&Page> {
        let page_height = self.page_height_screen();
        let mut index = 0;
        while index < self.pages.len() && self.page_top(index) + page_height <= top {
            index += 1;
        }
        while index < self.pages.len() && self.page_top(index) <= bottom {
            index = self.lay_out_if_needed(index);
        }

        self.pages
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                let page_top = self.page_top(*index);
                page_top <= bottom && page_top + page_height > top
            })
            .map(|(_, page)| page)
            .collect()
    }

    /// Lay out pages `first..=last` for printing
    pub fn prepare_to_print(&mut self, first: usize, last: usize) -> Vec<&Page> {
        let mut index = first;
        while index <= last && index < self.pages.len() {
            index = self.lay_out_if_needed(index);
        }
        let end = last.saturating_add(1).min(self.pages.len());
        self.pages.get(first..end).map(|pages| pages.iter().collect()).unwrap_or_default()
    }

    /// Returns the index to continue from
    fn lay_out_if_needed(&mut self, index: usize) -> usize {
        let handle = self.pages[index].handle();
        if self.pages[index].needs_layout() {
            self.lay_out_page(handle);
        }
        match self.index_of_page(handle) {
            Some(current) => current + 1,
            // The page disappeared; whatever replaced it is at `index`
            None => index,
        }
    }

    /// Produce the real layout of one page
    pub(super) fn lay_out_page(&mut self, handle: PageHandle) {
        self.expand_page(handle);
        let Some(index) = self.index_of_page(handle) else {
            return;
        };
        let Some(frame) = self.page_frame(index) else {
            return;
        };
        log::trace!("laying out page {index} ({:?})", handle);

        let previous_carry = self.carry_out.remove(&handle);
        self.pages[index].clear_elements();

        let mut breaks: SmallVec<[(usize, i32); 2]> = SmallVec::new();
        let mut top = frame.top;
        let mut position = 0;
        while let Some(slot) = self.pages[index].slots().get(position).copied() {
            let first = position == 0;
            if !first && top >= frame.bottom() {
                self.move_slots_to_new_page(index, position);
                break;
            }

            let placed = self.lay_out_slot(index, slot, top, frame, first);
            if !first && placed.used_height == 0 {
                self.move_slots_to_new_page(index, position);
                break;
            }
            self.check_stream_record(index, slot.division, placed);

            let division = slot.division;
            let width = self.column_width(division);
            let height = self.division_height(division);
            if placed.next_start > height {
                self.divisions[division].extend_height(width, placed.next_start);
            } else if first
                && placed.used_height == 0
                && placed.next_start < height
                && self.pages[index].elements().is_empty()
            {
                log::warn!(
                    "division {division}: stream placed nothing at {}, estimate was {height}",
                    placed.next_start
                );
                self.divisions[division].note_height_change(width, placed.next_start - height);
            }
            breaks.push((division, placed.next_start));

            // Later divisions only start once this one is done
            if placed.next_start < self.division_height(division) {
                break;
            }
            top += placed.used_height;
            position += 1;
        }

        self.pages[index].set_needs_layout(false);
        let carry_changed = self.carry_out.get(&handle) != previous_carry.as_ref();
        for (division, next_start) in breaks {
            self.reconcile_break(handle, division, next_start, carry_changed);
        }
    }

    /// Replace estimates in the region each slot of the page will show,
    /// feeding every reported change through `adjust_scroll_range`
    fn expand_page(&mut self, handle: PageHandle) {
        let mut position = 0;
        loop {
            let Some(index) = self.index_of_page(handle) else {
                return;
            };
            let Some(slot) = self.pages[index].slots().get(position).copied() else {
                return;
            };
            let division = slot.division;
            let width = self.column_width(division);
            let stream = self.divisions[division].main_stream().clone();

            let mut settled = false;
            for _ in 0..MAX_EXPANSION_PASSES {
                let Some(index) = self.index_of_page(handle) else {
                    return;
                };
                let Some(offset) = self.pages[index].offset_from_top_of_div(division) else {
                    settled = true;
                    break;
                };
                let capacity = self.slot_capacity(index, position);
                if capacity <= 0 {
                    settled = true;
                    break;
                }
                let changes = stream.borrow_mut().expand_lazy(offset, offset + capacity, width);
                if changes.is_empty() {
                    settled = true;
                    break;
                }
                for change in changes {
                    self.adjust_scroll_range(&stream, change.position, change.delta);
                }
            }
            if !settled {
                log::warn!("division {division}: estimates on page {:?} kept changing", handle);
            }
            position += 1;
        }
    }

    fn lay_out_slot(
        &mut self,
        index: usize,
        slot: DivisionSlot,
        top: i32,
        frame: PageFrame,
        first: bool,
    ) -> PlacedText {
        let page_number = self.pages[index].page_number();
        let division = &self.divisions[slot.division];
        let run = ColumnRun {
            start: slot.offset,
            top,
            height: frame.bottom() - top,
            left_margin: division.left_margin(page_number, &self.geometry, &self.units),
            column_width: division.column_width(&self.geometry, &self.units),
            column_gap: division.column_gap(&self.units),
            force_progress: first,
        };
        if !first || !division.has_subordinate_streams() {
            return lay_out_columns(division, slot.division, &mut self.pages[index], run);
        }
        let carried = self.carry_in(index, slot.division);
        self.lay_out_with_notes(index, slot.division, run, frame, carried)
    }

    /// Lay out main text and the footnotes it references.
    ///
    /// Footnotes carried over from the previous page come first and may be
    /// split. Footnotes referenced on this page are placed in batches; when a
    /// batch does not fit, the main text is shortened by the shortfall and
    /// the page retried. Batches that still do not fit move to the next page
    /// of the division.
    fn lay_out_with_notes(
        &mut self,
        index: usize,
        division: usize,
        run: ColumnRun,
        frame: PageFrame,
        carried: Carry,
    ) -> PlacedText {
        let handle = self.pages[index].handle();
        let note_width = self.divisions[division].available_width(&self.geometry, &self.units);
        let mut main_height = run.height;
        let mut pass = 0;

        loop {
            pass += 1;
            let manager = &self.divisions[division];
            let page = &mut self.pages[index];
            page.clear_elements();
            let mut deferred: Carry = SmallVec::new();

            for (subordinate, ids) in batches(&carried, manager) {
                let placement = manager.add_dependent_objects(
                    division,
                    page,
                    subordinate,
                    &ids,
                    false,
                    frame,
                    run.left_margin,
                    note_width,
                );
                let mut rest = &ids[placement.laid_out..];
                let empty = !page.elements().iter().any(|element| !element.is_main_stream());
                if placement.laid_out == 0 && empty && !rest.is_empty() {
                    log::warn!("division {division}: {:?} is taller than a page, dropped", rest[0]);
                    rest = &rest[1..];
                }
                deferred.extend(rest.iter().map(|id| DependentRef::new(subordinate, *id)));
            }

            let (_, free_bottom) = page.free_space(frame);
            let column_run = ColumnRun {
                height: main_height.min(free_bottom - run.top),
                ..run
            };
            let placed = lay_out_columns(manager, division, page, column_run);
            let refs = manager
                .main_stream()
                .borrow()
                .dependent_objects(placed.start, placed.next_start);

            let mut shortfall = 0;
            let mut failed: Carry = SmallVec::new();
            for (subordinate, ids) in batches(&refs, manager) {
                let placement = manager.add_dependent_objects(
                    division,
                    page,
                    subordinate,
                    &ids,
                    true,
                    frame,
                    run.left_margin,
                    note_width,
                );
                if !placement.failed {
                    continue;
                }
                let needed: i32 = manager.measure_dependents(subordinate, &ids, note_width).iter().sum();
                let (free_top, free_bottom) = page.free_space(frame);
                shortfall += (needed - (free_bottom - free_top).max(0)).max(0);
                failed.extend(ids.iter().map(|id| DependentRef::new(subordinate, *id)));
            }

            let retry_height = placed.used_height - shortfall;
            if failed.is_empty() || pass >= MAX_NOTE_PASSES || retry_height <= 0 {
                deferred.extend(failed);
                if !deferred.is_empty() {
                    log::debug!("page {:?} defers {} footnotes", handle, deferred.len());
                    self.carry_out.insert(handle, deferred);
                }
                return placed;
            }
            log::trace!("page {:?}: shortening main text to {retry_height} for footnotes", handle);
            main_height = retry_height;
        }
    }

    /// Footnotes deferred by the previous page of the same division
    fn carry_in(&self, index: usize, division: usize) -> Carry {
        index
            .checked_sub(1)
            .and_then(|previous| self.pages.get(previous))
            .filter(|page| page.contains_division(division))
            .and_then(|page| self.carry_out.get(&page.handle()))
            .cloned()
            .unwrap_or_default()
    }

    /// Move the slot at `position` and every slot after it to a new page
    pub(super) fn move_slots_to_new_page(&mut self, index: usize, position: usize) {
        let Some(previous) = position
            .checked_sub(1)
            .and_then(|p| self.pages[index].slots().get(p))
            .map(|slot| slot.division)
        else {
            return;
        };
        let handle = self.pages[index].handle();
        let moved = self.pages[index].split_off_slots_after(previous);
        let Some((first, rest)) = moved.split_first() else {
            return;
        };
        for slot in moved.iter() {
            for stream in self.divisions[slot.division].streams() {
                stream.borrow_mut().page_discarded(handle);
            }
        }
        self.insert_continuation(index, first.division, 0, rest.iter().copied().collect());
        self.refresh_pages();
    }

    /// Compare what the stream recorded for the page with what was placed
    fn check_stream_record(&self, index: usize, division: usize, placed: PlacedText) {
        if placed.used_height == 0 {
            return;
        }
        let handle = self.pages[index].handle();
        let stream = self.divisions[division].main_stream().borrow();
        if let Some(position) = stream.page_position(handle) {
            if position != placed.start {
                log::debug!("division {division}: stream puts {:?} at {position}, placed at {}", handle, placed.start);
            }
        }
        if let Some(height) = stream.page_height(handle) {
            let shown = placed.next_start - placed.start;
            if height != shown {
                log::trace!("division {division}: stream reports {height}px on {:?}, placed {shown}px", handle);
            }
        }
    }

    // Space estimates used by page creation and repair

    /// Height the slots before `position` are expected to use on the page
    pub(super) fn used_before(&mut self, index: usize, position: usize) -> i32 {
        let Some(frame) = self.page_frame(index) else {
            return 0;
        };
        let mut used = 0;
        for k in 0..position {
            let Some(slot) = self.pages[index].slots().get(k).copied() else {
                break;
            };
            let room = (frame.height - used).max(0);
            used += self.slot_used(index, slot, room);
        }
        used
    }

    fn slot_used(&mut self, index: usize, slot: DivisionSlot, room: i32) -> i32 {
        let page = &self.pages[index];
        if !page.needs_layout() {
            let main = page
                .elements()
                .iter()
                .filter(|element| element.division() == slot.division && element.is_main_stream());
            let (top, bottom) = main.fold((i32::MAX, i32::MIN), |(top, bottom), element| {
                let location = element.location();
                (top.min(location.y), bottom.max(location.bottom()))
            });
            return if bottom > top { (bottom - top).min(room) } else { 0 };
        }
        let columns = self.divisions[slot.division].columns() as i32;
        let remaining = (self.division_height(slot.division) - slot.offset).max(0);
        ((remaining + columns - 1) / columns).min(room)
    }

    /// Main-stream content the slot at `position` can hold on the page
    pub(super) fn slot_capacity(&mut self, index: usize, position: usize) -> i32 {
        let Some(frame) = self.page_frame(index) else {
            return 0;
        };
        let Some(slot) = self.pages[index].slots().get(position).copied() else {
            return 0;
        };
        let columns = self.divisions[slot.division].columns() as i32;
        columns * (frame.height - self.used_before(index, position))
    }

    /// Height still free after every slot on the page
    fn room_on_page(&mut self, index: usize) -> i32 {
        let Some(frame) = self.page_frame(index) else {
            return 0;
        };
        let slots = self.pages[index].slots().len();
        frame.height - self.used_before(index, slots)
    }
}
