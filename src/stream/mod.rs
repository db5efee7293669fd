//! Content streams: the measuring and drawing engine behind each division
//!
//! The pagination core never measures text itself. Every division's main
//! flow and every subordinate flow (footnotes) is a [`ContentStream`]. Stream
//! coordinates are printer pixels measured from the top of the stream laid
//! out as one long column of the requested width.

mod block;
mod notes;
mod registry;

pub use block::{Block, BlockStream};
pub use notes::NoteStream;
pub use registry::StreamRegistry;

use crate::page::{Affinity, ContentLocation, PageHandle};
use smallvec::SmallVec;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Identifier of a document object (paragraph owner, footnote, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId(pub u64);

/// Identity of a shared stream; stable for as long as the stream is alive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub usize);

/// A lazily estimated region whose real height became known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightChange {
    /// Top of the changed region, in stream coordinates before the change
    pub position: i32,
    pub delta: i32,
}

impl HeightChange {
    pub fn new(position: i32, delta: i32) -> Self {
        Self { position, delta }
    }
}

/// Request to fill one column of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub width: i32,
    pub available_height: i32,
    /// Stream position the column should start at
    pub start: i32,
    pub handle: PageHandle,
    /// 1-based column index
    pub column: usize,
    pub total_columns: usize,
    /// The column is the first thing on an otherwise empty page: at least
    /// one unit must be placed even if it does not fit
    pub force_progress: bool,
}

/// What a stream placed for a [`PageRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageBreak {
    /// Actual start; streams may snap the requested start back to the top
    /// of the line containing it
    pub start: i32,
    pub used_height: i32,
    pub next_start: i32,
}

/// Reference from main content to an object of a subordinate stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependentRef {
    /// Index into the division's subordinate stream list
    pub subordinate: usize,
    pub object: ObjectId,
}

impl DependentRef {
    pub fn new(subordinate: usize, object: ObjectId) -> Self {
        Self { subordinate, object }
    }
}

/// Measuring and layout engine for one flow of content
pub trait ContentStream {
    /// Best current estimate of the total height at the given column width
    fn estimate_height(&mut self, width: i32) -> i32;

    /// Replace estimates overlapping `[top, bottom)` with real measurements.
    ///
    /// Changes are returned in application order: each position is expressed
    /// in coordinates that already include the preceding changes.
    fn expand_lazy(&mut self, top: i32, bottom: i32, width: i32) -> SmallVec<[HeightChange; 2]> {
        let _ = (top, bottom, width);
        SmallVec::new()
    }

    /// Lay out one column of a page. Must not change any height.
    fn layout_page(&mut self, request: &PageRequest) -> PageBreak;

    /// Where the stream placed the page with this handle, if it did
    fn page_position(&self, handle: PageHandle) -> Option<i32> {
        let _ = handle;
        None
    }

    /// Height the stream used on the page with this handle, if it did
    fn page_height(&self, handle: PageHandle) -> Option<i32> {
        let _ = handle;
        None
    }

    /// The page was deleted; forget whatever was recorded for it
    fn page_discarded(&mut self, handle: PageHandle) {
        let _ = handle;
    }

    /// Subordinate objects referenced by content starting in `[top, bottom)`
    fn dependent_objects(&self, top: i32, bottom: i32) -> SmallVec<[DependentRef; 4]> {
        let _ = (top, bottom);
        SmallVec::new()
    }

    /// Heights of the given objects laid out at `width`, in order
    fn measure_objects(&mut self, ids: &[ObjectId], width: i32) -> SmallVec<[i32; 4]> {
        let _ = width;
        ids.iter().map(|_| 0).collect()
    }

    /// Stream position of the top of an object
    fn object_position(&self, id: ObjectId) -> Option<i32> {
        let _ = id;
        None
    }

    /// Document location shown at stream position `y`
    fn location_at(&self, y: i32, affinity: Affinity) -> Option<ContentLocation> {
        let _ = (y, affinity);
        None
    }

    /// Release rendering resources. Called once per stream.
    fn dispose(&mut self) {}
}

/// Reference-counted stream handle; equality and hashing follow identity
#[derive(Clone)]
pub struct SharedStream(Rc<RefCell<dyn ContentStream>>);

impl SharedStream {
    pub fn new<S: ContentStream + 'static>(stream: S) -> Self {
        Self(Rc::new(RefCell::new(stream)))
    }

    /// Wrap a stream the caller keeps a typed handle to
    pub fn from_rc<S: ContentStream + 'static>(stream: Rc<RefCell<S>>) -> Self {
        Self(stream)
    }

    pub fn id(&self) -> StreamId {
        StreamId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    pub fn borrow(&self) -> Ref<'_, dyn ContentStream> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn ContentStream> {
        self.0.borrow_mut()
    }
}

impl PartialEq for SharedStream {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for SharedStream {}

impl Hash for SharedStream {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for SharedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedStream({:#x})", self.id().0)
    }
}
