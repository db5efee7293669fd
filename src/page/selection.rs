//! Content addressing for page-relative selections

use crate::stream::ObjectId;
use std::cmp::Ordering;

/// A location in document content as (object, paragraph, character offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ContentLocation {
    /// The object owning the paragraph
    pub object: ObjectId,
    /// Paragraph index within the stream
    pub paragraph: usize,
    /// Character offset within the paragraph
    pub offset: usize,
}

impl ContentLocation {
    pub fn new(object: ObjectId, paragraph: usize, offset: usize) -> Self {
        Self {
            object,
            paragraph,
            offset,
        }
    }
}

impl PartialOrd for ContentLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContentLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.paragraph
            .cmp(&other.paragraph)
            .then(self.offset.cmp(&other.offset))
            .then(self.object.cmp(&other.object))
    }
}

/// Which side of an ambiguous position a location binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    /// End of the preceding content
    Upstream,
    /// Start of the following content
    #[default]
    Downstream,
}

/// Selection expressed in content terms (anchor + end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSelection {
    pub anchor: ContentLocation,
    pub end: ContentLocation,
    pub affinity: Affinity,
}

impl PageSelection {
    pub fn new(anchor: ContentLocation, end: ContentLocation) -> Self {
        Self {
            anchor,
            end,
            affinity: Affinity::Downstream,
        }
    }

    /// Zero-width selection (insertion point)
    pub fn collapsed(location: ContentLocation, affinity: Affinity) -> Self {
        Self {
            anchor: location,
            end: location,
            affinity,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.end
    }

    /// Get ordered start and end locations
    pub fn ordered(&self) -> (ContentLocation, ContentLocation) {
        if self.anchor <= self.end {
            (self.anchor, self.end)
        } else {
            (self.end, self.anchor)
        }
    }
}
