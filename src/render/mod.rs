//! Render output: display list for the visible pages

mod display;

pub use display::{DisplayItem, DisplayList, DisplayPage};
