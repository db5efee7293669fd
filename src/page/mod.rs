//! Pages and the elements placed on them

mod element;
mod page;
mod selection;

pub use element::{ColumnInfo, PageElement};
pub use page::{DivisionSlot, Page, PageFrame, PageHandle};
pub use selection::{Affinity, ContentLocation, PageSelection};
