//! Page geometry: unit conversions and publication/division settings

mod settings;
mod units;

pub use settings::{BindingEdge, DivisionSettings, Margins, PublicationGeometry, Sides, StartAt};
pub use units::{Dpi, Units, DEFAULT_SCREEN_DPI, MILLIPOINTS_PER_INCH};
