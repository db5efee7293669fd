//! Reference subordinate stream: a sequence of fixed-height notes

use crate::page::{Affinity, ContentLocation};
use crate::stream::{ContentStream, ObjectId, PageBreak, PageRequest};
use smallvec::SmallVec;

/// Notes laid out one after another, each with a known height
#[derive(Debug, Default)]
pub struct NoteStream {
    notes: Vec<(ObjectId, i32)>,
    dispose_count: usize,
}

impl NoteStream {
    pub fn new(notes: Vec<(ObjectId, i32)>) -> Self {
        Self {
            notes,
            dispose_count: 0,
        }
    }

    pub fn dispose_count(&self) -> usize {
        self.dispose_count
    }

    pub fn set_height(&mut self, id: ObjectId, height: i32) {
        if let Some(note) = self.notes.iter_mut().find(|(note, _)| *note == id) {
            note.1 = height;
        }
    }

    fn height_of(&self, id: ObjectId) -> i32 {
        self.notes
            .iter()
            .find(|(note, _)| *note == id)
            .map(|(_, height)| *height)
            .unwrap_or(0)
    }
}

impl ContentStream for NoteStream {
    fn estimate_height(&mut self, _width: i32) -> i32 {
        self.notes.iter().map(|(_, height)| height).sum()
    }

    fn layout_page(&mut self, request: &PageRequest) -> PageBreak {
        let mut top = 0;
        let mut start = request.start;
        let mut end = None;
        for (_, height) in &self.notes {
            let bottom = top + height;
            if bottom > start {
                if end.is_none() {
                    start = start.min(top);
                }
                let fits = bottom - start <= request.available_height;
                if !fits && (end.is_some() || !request.force_progress) {
                    break;
                }
                end = Some(bottom);
            }
            top = bottom;
        }
        let next_start = end.unwrap_or(start);
        PageBreak {
            start,
            used_height: next_start - start,
            next_start,
        }
    }

    fn measure_objects(&mut self, ids: &[ObjectId], _width: i32) -> SmallVec<[i32; 4]> {
        ids.iter().map(|id| self.height_of(*id)).collect()
    }

    fn object_position(&self, id: ObjectId) -> Option<i32> {
        let mut top = 0;
        for (note, height) in &self.notes {
            if *note == id {
                return Some(top);
            }
            top += height;
        }
        None
    }

    fn location_at(&self, y: i32, affinity: Affinity) -> Option<ContentLocation> {
        let mut top = 0;
        for (index, (note, height)) in self.notes.iter().enumerate() {
            let bottom = top + height;
            let inside = match affinity {
                Affinity::Downstream => y >= top && y < bottom,
                Affinity::Upstream => y > top && y <= bottom,
            };
            if inside {
                return Some(ContentLocation::new(*note, index, 0));
            }
            top = bottom;
        }
        None
    }

    fn dispose(&mut self) {
        self.dispose_count += 1;
    }
}
