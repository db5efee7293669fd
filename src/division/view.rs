//! View strategy injected into a division

use crate::stream::ObjectId;

/// Facts about a page handed to header and footer providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageContext {
    pub division: usize,
    /// Page number within the division (1-based)
    pub page_number: usize,
    /// Index of the page in the publication
    pub page_index: usize,
    /// Pages whose first division is this one
    pub division_page_count: usize,
}

/// What a division shows and how: supplied by the view-construction side
pub trait DivisionView {
    /// Document object at the root of the division's content
    fn root_object(&self) -> ObjectId;

    /// Fragment identifier used to render the root
    fn fragment(&self) -> u32 {
        0
    }

    /// Whether the main stream reads right to left
    fn is_right_to_left(&self) -> bool {
        false
    }

    fn header(&self, context: &PageContext) -> Option<String> {
        let _ = context;
        None
    }

    fn footer(&self, context: &PageContext) -> Option<String> {
        let _ = context;
        None
    }
}

/// Plain view: optional running title and page-number footer
#[derive(Debug, Clone, Default)]
pub struct BasicView {
    pub root: ObjectId,
    pub fragment: u32,
    pub right_to_left: bool,
    pub title: Option<String>,
    pub page_numbers: bool,
}

impl BasicView {
    pub fn new(root: ObjectId) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    pub fn right_to_left(mut self, right_to_left: bool) -> Self {
        self.right_to_left = right_to_left;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_page_numbers(mut self) -> Self {
        self.page_numbers = true;
        self
    }
}

impl DivisionView for BasicView {
    fn root_object(&self) -> ObjectId {
        self.root
    }

    fn fragment(&self) -> u32 {
        self.fragment
    }

    fn is_right_to_left(&self) -> bool {
        self.right_to_left
    }

    fn header(&self, _context: &PageContext) -> Option<String> {
        self.title.clone()
    }

    fn footer(&self, context: &PageContext) -> Option<String> {
        self.page_numbers
            .then(|| format!("{} / {}", context.page_number, context.division_page_count))
    }
}
