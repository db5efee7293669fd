use thiserror::Error;

/// Construction-time failures. Pagination itself never fails: deferrals are
/// reported through flags and stale lookups return `None`.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("A division needs at least one column, got {0}.")]
    InvalidColumnCount(usize),
    #[error("Resolution must be positive, got {x}x{y} DPI.")]
    InvalidResolution { x: i32, y: i32 },
    #[error("Page size must be positive, got {width}x{height} millipoints.")]
    InvalidPageSize { width: i32, height: i32 },
    #[error("Could not parse settings: {0}")]
    Settings(#[from] serde_json::Error),
}
