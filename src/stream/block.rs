//! Reference stream made of lazily measured blocks of lines
//!
//! Each block starts out at its estimated height. Expanding a block replaces
//! the estimate with `lines * line_height`. Line heights do not depend on the
//! column width.

use crate::page::{Affinity, ContentLocation, PageHandle};
use crate::stream::{ContentStream, DependentRef, HeightChange, ObjectId, PageBreak, PageRequest};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// A run of equally tall lines belonging to one document object
#[derive(Debug, Clone)]
pub struct Block {
    pub object: ObjectId,
    pub lines: usize,
    pub line_height: i32,
    /// Height assumed until the block is expanded
    pub estimated_height: i32,
    /// Characters per line, for content addressing
    pub chars_per_line: usize,
    /// Subordinate objects referenced from a given line
    pub references: SmallVec<[(usize, DependentRef); 2]>,
    expanded: bool,
}

impl Block {
    /// A block whose estimate is exact
    pub fn new(object: ObjectId, lines: usize, line_height: i32) -> Self {
        Self {
            object,
            lines,
            line_height,
            estimated_height: lines as i32 * line_height,
            chars_per_line: 60,
            references: SmallVec::new(),
            expanded: false,
        }
    }

    pub fn with_estimate(mut self, estimated_height: i32) -> Self {
        self.estimated_height = estimated_height.max(0);
        self
    }

    pub fn with_reference(mut self, line: usize, reference: DependentRef) -> Self {
        self.references.push((line, reference));
        self
    }

    pub fn real_height(&self) -> i32 {
        self.lines as i32 * self.line_height
    }

    pub fn current_height(&self) -> i32 {
        if self.expanded {
            self.real_height()
        } else {
            self.estimated_height
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Top of a line relative to the block, using current heights
    fn line_top(&self, line: usize) -> i32 {
        if self.expanded {
            line as i32 * self.line_height
        } else if self.lines == 0 {
            0
        } else {
            (line as i64 * self.estimated_height as i64 / self.lines as i64) as i32
        }
    }
}

/// Main-stream implementation over a list of [`Block`]s
#[derive(Debug, Default)]
pub struct BlockStream {
    blocks: Vec<Block>,
    /// Start and used height recorded per page handle
    pages: FxHashMap<PageHandle, (i32, i32)>,
    dispose_count: usize,
}

impl BlockStream {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            pages: FxHashMap::default(),
            dispose_count: 0,
        }
    }

    /// A stream of `count` blocks with exact estimates
    pub fn uniform(count: usize, lines: usize, line_height: i32) -> Self {
        Self::new(
            (0..count)
                .map(|i| Block::new(ObjectId(i as u64 + 1), lines, line_height))
                .collect(),
        )
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn total_height(&self) -> i32 {
        self.blocks.iter().map(Block::current_height).sum()
    }

    pub fn real_height(&self) -> i32 {
        self.blocks.iter().map(Block::real_height).sum()
    }

    pub fn dispose_count(&self) -> usize {
        self.dispose_count
    }

    /// Expand every block; returns the changes in application order
    pub fn expand_all(&mut self) -> SmallVec<[HeightChange; 2]> {
        let total = self.total_height();
        self.expand_lazy(0, total.max(1), 0)
    }
}

impl ContentStream for BlockStream {
    fn estimate_height(&mut self, _width: i32) -> i32 {
        self.total_height()
    }

    fn expand_lazy(&mut self, top: i32, bottom: i32, _width: i32) -> SmallVec<[HeightChange; 2]> {
        let mut changes = SmallVec::new();
        let mut y = 0;
        for block in &mut self.blocks {
            if y >= bottom {
                break;
            }
            let height = block.current_height();
            let overlaps = y + height > top || (height == 0 && y >= top);
            if overlaps && !block.expanded {
                block.expanded = true;
                let delta = block.real_height() - height;
                if delta != 0 {
                    changes.push(HeightChange::new(y, delta));
                }
            }
            y += block.current_height();
        }
        changes
    }

    fn layout_page(&mut self, request: &PageRequest) -> PageBreak {
        let mut start = request.start;
        let mut end = start;
        let mut started = false;
        let mut placed = false;
        let mut y = 0;

        'blocks: for block in &self.blocks {
            let height = block.current_height();
            let block_end = y + height;
            if block_end <= start || height == 0 {
                y = block_end;
                continue;
            }

            if block.expanded {
                for line in 0..block.lines {
                    let top = y + block.line_top(line);
                    let bottom = top + block.line_height;
                    if bottom <= start {
                        continue;
                    }
                    if !started {
                        start = start.min(top);
                        started = true;
                    }
                    let fits = bottom - start <= request.available_height;
                    if !fits && (placed || !request.force_progress) {
                        break 'blocks;
                    }
                    end = bottom;
                    placed = true;
                }
            } else {
                // Unmeasured content can be cut anywhere
                if !started {
                    started = true;
                }
                let from = start.max(y);
                let limit = start + request.available_height;
                if block_end <= limit {
                    end = block_end;
                    placed = true;
                } else {
                    if limit > from {
                        end = limit;
                        placed = true;
                    } else if !placed && request.force_progress {
                        end = block_end;
                        placed = true;
                    }
                    break;
                }
            }
            y = block_end;
        }

        let used_height = if placed { end - start } else { 0 };
        let next_start = if placed { end } else { start };

        if request.column <= 1 {
            self.pages.insert(request.handle, (start, used_height));
        } else if let Some(record) = self.pages.get_mut(&request.handle) {
            record.1 += used_height;
        }

        PageBreak {
            start,
            used_height,
            next_start,
        }
    }

    fn page_position(&self, handle: PageHandle) -> Option<i32> {
        self.pages.get(&handle).map(|(start, _)| *start)
    }

    fn page_height(&self, handle: PageHandle) -> Option<i32> {
        self.pages.get(&handle).map(|(_, height)| *height)
    }

    fn page_discarded(&mut self, handle: PageHandle) {
        self.pages.remove(&handle);
    }

    fn dependent_objects(&self, top: i32, bottom: i32) -> SmallVec<[DependentRef; 4]> {
        let mut found = SmallVec::new();
        let mut y = 0;
        for block in &self.blocks {
            if y >= bottom {
                break;
            }
            let block_end = y + block.current_height();
            if block_end > top || block.current_height() == 0 {
                for (line, reference) in &block.references {
                    let line_top = y + block.line_top(*line);
                    if line_top >= top && line_top < bottom {
                        found.push(*reference);
                    }
                }
            }
            y = block_end;
        }
        found
    }

    fn location_at(&self, y: i32, affinity: Affinity) -> Option<ContentLocation> {
        let mut top = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            let height = block.current_height();
            let bottom = top + height;
            let inside = match affinity {
                Affinity::Downstream => y >= top && y < bottom,
                Affinity::Upstream => y > top && y <= bottom,
            };
            if inside && block.lines > 0 {
                let line_height = (height / block.lines as i32).max(1);
                let offset = match affinity {
                    Affinity::Downstream => {
                        let line = ((y - top) / line_height) as usize;
                        line.min(block.lines - 1) * block.chars_per_line
                    }
                    Affinity::Upstream => {
                        let line = ((y - top - 1) / line_height) as usize;
                        (line.min(block.lines - 1) + 1) * block.chars_per_line
                    }
                };
                return Some(ContentLocation::new(block.object, index, offset));
            }
            top = bottom;
        }
        None
    }

    fn dispose(&mut self) {
        self.dispose_count += 1;
        self.pages.clear();
    }
}
