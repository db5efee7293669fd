//! Ownership tracking for streams shared between divisions

use crate::stream::{SharedStream, StreamId};
use rustc_hash::FxHashMap;

/// Remembers which division registered each stream first, and disposes
/// every distinct stream exactly once
#[derive(Debug, Default)]
pub struct StreamRegistry {
    /// Maps stream identity to owning division
    owners: FxHashMap<StreamId, usize>,
    /// Streams in registration order
    streams: Vec<SharedStream>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stream reference; returns true if this caller became the owner
    pub fn register(&mut self, stream: &SharedStream, division: usize) -> bool {
        let id = stream.id();
        if self.owners.contains_key(&id) {
            return false;
        }
        self.owners.insert(id, division);
        self.streams.push(stream.clone());
        true
    }

    pub fn owner(&self, id: StreamId) -> Option<usize> {
        self.owners.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Dispose every registered stream once and forget them.
    /// Returns how many streams were disposed.
    pub fn dispose_all(&mut self) -> usize {
        let count = self.streams.len();
        for stream in self.streams.drain(..) {
            log::trace!("disposing {:?}", stream);
            stream.borrow_mut().dispose();
        }
        self.owners.clear();
        count
    }
}
