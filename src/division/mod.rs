//! Divisions: independent content flows with their own columns and margins

mod manager;
mod subordinate;
mod view;

pub use manager::{ColumnSlice, DependentPlacement, DivisionLayoutManager};
pub use subordinate::{GroupingScope, SubordinateStream};
pub use view::{BasicView, DivisionView, PageContext};
