//! Layout manager for one division

use crate::division::{DivisionView, GroupingScope, SubordinateStream};
use crate::geometry::{DivisionSettings, Margins, PublicationGeometry, StartAt, Units};
use crate::page::{ColumnInfo, Page, PageElement, PageFrame};
use crate::stream::{ObjectId, SharedStream};
use crate::{LayoutError, Rect};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// How much of a division's main stream one column of one page shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSlice {
    /// 1-based column index
    pub column: usize,
    pub total_columns: usize,
    pub used_height: i32,
    /// Offset from the top of the division where the column starts
    pub offset: i32,
    /// Height available to the column
    pub column_height: i32,
}

/// Outcome of placing a batch of subordinate objects on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DependentPlacement {
    pub laid_out: usize,
    /// Not every object of the batch was placed
    pub failed: bool,
}

/// One structural division: main stream, subordinate streams, columns,
/// margins and where it starts
pub struct DivisionLayoutManager {
    settings: DivisionSettings,
    main: SharedStream,
    view: Box<dyn DivisionView>,
    subordinates: Vec<SubordinateStream>,
    /// Last known main-stream height per column width
    height_cache: FxHashMap<i32, i32>,
}

impl fmt::Debug for DivisionLayoutManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DivisionLayoutManager")
            .field("settings", &self.settings)
            .field("main", &self.main)
            .field("subordinates", &self.subordinates)
            .field("root", &self.view.root_object())
            .finish()
    }
}

impl DivisionLayoutManager {
    pub fn new(
        settings: DivisionSettings,
        main: SharedStream,
        view: impl DivisionView + 'static,
    ) -> Result<Self, LayoutError> {
        settings.validate()?;
        Ok(Self {
            settings,
            main,
            view: Box::new(view),
            subordinates: Vec::new(),
            height_cache: FxHashMap::default(),
        })
    }

    /// Attach a subordinate stream; returns its index for [`DependentRef`]s
    ///
    /// [`DependentRef`]: crate::stream::DependentRef
    pub fn add_subordinate_stream(&mut self, stream: SharedStream, scope: GroupingScope) -> usize {
        self.subordinates.push(SubordinateStream::new(stream, scope));
        self.subordinates.len() - 1
    }

    pub fn settings(&self) -> &DivisionSettings {
        &self.settings
    }

    pub fn columns(&self) -> usize {
        self.settings.columns
    }

    pub fn margins(&self) -> Margins {
        self.settings.margins
    }

    pub fn start_at(&self) -> StartAt {
        self.settings.start_at
    }

    pub fn main_stream(&self) -> &SharedStream {
        &self.main
    }

    pub fn subordinates(&self) -> &[SubordinateStream] {
        &self.subordinates
    }

    pub fn has_subordinate_streams(&self) -> bool {
        !self.subordinates.is_empty()
    }

    pub fn view(&self) -> &dyn DivisionView {
        self.view.as_ref()
    }

    pub fn is_right_to_left(&self) -> bool {
        self.view.is_right_to_left()
    }

    /// Every stream this division references: main first
    pub fn streams(&self) -> impl Iterator<Item = &SharedStream> + '_ {
        std::iter::once(&self.main).chain(self.subordinates.iter().map(|sub| &sub.stream))
    }

    pub fn top_margin(&self, units: &Units) -> i32 {
        units.mp_to_printer_y(self.settings.margins.top)
    }

    pub fn bottom_margin(&self, units: &Units) -> i32 {
        units.mp_to_printer_y(self.settings.margins.bottom)
    }

    pub fn left_margin(&self, page_number: usize, geometry: &PublicationGeometry, units: &Units) -> i32 {
        let margins = self.settings.margins;
        let millipoints = if geometry.inside_margin_on_left(page_number) {
            margins.inside
        } else {
            margins.outside
        };
        units.mp_to_printer_x(millipoints)
    }

    pub fn right_margin(&self, page_number: usize, geometry: &PublicationGeometry, units: &Units) -> i32 {
        let margins = self.settings.margins;
        let millipoints = if geometry.inside_margin_on_left(page_number) {
            margins.outside
        } else {
            margins.inside
        };
        units.mp_to_printer_x(millipoints)
    }

    /// Width between the side margins, in printer pixels
    pub fn available_width(&self, geometry: &PublicationGeometry, units: &Units) -> i32 {
        let margins = self.settings.margins;
        units
            .mp_to_printer_x(geometry.page_width - margins.inside - margins.outside)
            .max(0)
    }

    pub fn column_gap(&self, units: &Units) -> i32 {
        if self.settings.columns > 1 {
            units.mp_to_printer_x(self.settings.column_gap)
        } else {
            0
        }
    }

    pub fn column_width(&self, geometry: &PublicationGeometry, units: &Units) -> i32 {
        let columns = self.settings.columns as i32;
        let gaps = self.column_gap(units) * (columns - 1);
        ((self.available_width(geometry, units) - gaps) / columns).max(0)
    }

    /// Best current estimate of the main stream's height in one column of
    /// the given width. Repeated calls at the same width agree until a
    /// correction is recorded.
    pub fn estimate_height(&mut self, column_width: i32) -> i32 {
        if let Some(height) = self.height_cache.get(&column_width) {
            return *height;
        }
        let height = self.main.borrow_mut().estimate_height(column_width).max(0);
        self.height_cache.insert(column_width, height);
        height
    }

    pub fn cached_height(&self, column_width: i32) -> Option<i32> {
        self.height_cache.get(&column_width).copied()
    }

    /// Record a measured correction at the current width. Heights cached
    /// for other widths are dropped since the change cannot be mapped there.
    pub fn note_height_change(&mut self, column_width: i32, delta: i32) -> i32 {
        let height = self.estimate_height(column_width);
        let corrected = (height + delta).max(0);
        self.height_cache.clear();
        self.height_cache.insert(column_width, corrected);
        corrected
    }

    /// Raise the cached height when the stream laid out past it
    pub(crate) fn extend_height(&mut self, column_width: i32, height: i32) {
        let entry = self.height_cache.entry(column_width).or_insert(0);
        *entry = (*entry).max(height);
    }

    /// Left edge of a column: columns run right to left for RTL divisions
    pub fn column_left(&self, column: usize, left_margin: i32, column_width: i32, column_gap: i32) -> i32 {
        let columns = self.settings.columns.max(1);
        let visual = if self.is_right_to_left() {
            columns - column.clamp(1, columns)
        } else {
            column.clamp(1, columns) - 1
        };
        left_margin + visual as i32 * (column_width + column_gap)
    }

    /// Create the element recording how much of the main stream one column
    /// of the page shows
    #[allow(clippy::too_many_arguments)]
    pub fn add_element(
        &self,
        division: usize,
        page: &mut Page,
        slice: ColumnSlice,
        left_margin: i32,
        top: i32,
        column_width: i32,
        column_gap: i32,
    ) -> usize {
        let x = self.column_left(slice.column, left_margin, column_width, column_gap);
        let element = PageElement::main(
            division,
            self.main.clone(),
            Rect::new(x, top, column_width, slice.used_height),
            slice.offset,
            ColumnInfo {
                column: slice.column,
                total_columns: slice.total_columns,
                gap: column_gap,
                height: slice.column_height,
            },
            self.is_right_to_left(),
        );
        page.add_page_element(element)
    }

    /// Heights of subordinate objects, one per id. Objects the stream did not
    /// measure count as empty.
    pub fn measure_dependents(&self, subordinate: usize, ids: &[ObjectId], width: i32) -> SmallVec<[i32; 4]> {
        let Some(sub) = self.subordinates.get(subordinate) else {
            return ids.iter().map(|_| 0).collect();
        };
        let measured = sub.stream.borrow_mut().measure_objects(ids, width);
        if measured.len() != ids.len() {
            log::warn!(
                "{:?} measured {} of {} objects",
                sub.stream,
                measured.len(),
                ids.len()
            );
        }
        (0..ids.len()).map(|i| measured.get(i).copied().unwrap_or(0)).collect()
    }

    /// Place a batch of subordinate objects in the free space at the bottom
    /// of the page.
    ///
    /// With `allow_fail` the batch is atomic: if it does not fit entirely,
    /// nothing is placed and the whole batch is reported as failed. Without
    /// it, the longest prefix that fits is placed.
    #[allow(clippy::too_many_arguments)]
    pub fn add_dependent_objects(
        &self,
        division: usize,
        page: &mut Page,
        subordinate: usize,
        ids: &[ObjectId],
        allow_fail: bool,
        frame: PageFrame,
        left_margin: i32,
        width: i32,
    ) -> DependentPlacement {
        if ids.is_empty() {
            return DependentPlacement::default();
        }
        let Some(sub) = self.subordinates.get(subordinate) else {
            log::warn!("division {division} has no subordinate stream {subordinate}");
            return DependentPlacement {
                laid_out: 0,
                failed: true,
            };
        };

        let heights = self.measure_dependents(subordinate, ids, width);
        let (free_top, free_bottom) = page.free_space(frame);
        let free = (free_bottom - free_top).max(0);
        let total: i32 = heights.iter().sum();

        let count = if total <= free {
            ids.len()
        } else if allow_fail {
            return DependentPlacement {
                laid_out: 0,
                failed: true,
            };
        } else {
            let mut used = 0;
            heights
                .iter()
                .take_while(|height| {
                    used += **height;
                    used <= free
                })
                .count()
        };

        let height: i32 = heights[..count].iter().sum();
        if count > 0 && height > 0 {
            let offset = sub.stream.borrow().object_position(ids[0]).unwrap_or(0);
            let location = Rect::new(left_margin, free_bottom - height, width, height);
            page.add_page_element(PageElement::subordinate(
                division,
                sub.stream.clone(),
                location,
                offset,
                false,
            ));
        }

        DependentPlacement {
            laid_out: count,
            failed: count < ids.len(),
        }
    }
}
