//! Secondary streams laid out alongside a division's main text

use crate::stream::SharedStream;

/// How references to subordinate objects are batched on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingScope {
    /// Every object referenced from a page is placed together or not at all
    #[default]
    Page,
    /// Each object is placed on its own
    Object,
}

/// A subordinate stream (e.g. footnotes) attached to a division
#[derive(Debug, Clone, PartialEq)]
pub struct SubordinateStream {
    pub stream: SharedStream,
    pub scope: GroupingScope,
}

impl SubordinateStream {
    pub fn new(stream: SharedStream, scope: GroupingScope) -> Self {
        Self { stream, scope }
    }
}
