//! Conversions between millipoints, printer pixels and screen pixels
//!
//! Layout happens in printer pixels. The screen shows the same layout scaled
//! by `zoom * screen_dpi / printer_dpi`. Every conversion rounds to the
//! nearest pixel, so results are monotonic but may be off by one pixel
//! compared with an exact rational computation.

use crate::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Device-independent units per inch
pub const MILLIPOINTS_PER_INCH: i32 = 72000;

/// Resolution assumed for the screen when the host does not report one
pub const DEFAULT_SCREEN_DPI: i32 = 96;

/// Horizontal and vertical resolution of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dpi {
    pub x: i32,
    pub y: i32,
}

impl Dpi {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Same resolution on both axes
    pub fn uniform(dpi: i32) -> Self {
        Self { x: dpi, y: dpi }
    }

    pub fn is_valid(&self) -> bool {
        self.x > 0 && self.y > 0
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Self::uniform(DEFAULT_SCREEN_DPI)
    }
}

/// Conversion context for one publication at one zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    pub printer: Dpi,
    pub screen: Dpi,
    pub zoom: f64,
}

fn round(value: f64) -> i32 {
    value.round() as i32
}

impl Units {
    pub fn new(printer: Dpi, screen: Dpi, zoom: f64) -> Self {
        Self { printer, screen, zoom }
    }

    pub fn mp_to_printer_x(&self, millipoints: i32) -> i32 {
        round(millipoints as f64 * self.printer.x as f64 / MILLIPOINTS_PER_INCH as f64)
    }

    pub fn mp_to_printer_y(&self, millipoints: i32) -> i32 {
        round(millipoints as f64 * self.printer.y as f64 / MILLIPOINTS_PER_INCH as f64)
    }

    pub fn mp_to_screen_x(&self, millipoints: i32) -> i32 {
        round(millipoints as f64 * self.zoom * self.screen.x as f64 / MILLIPOINTS_PER_INCH as f64)
    }

    pub fn mp_to_screen_y(&self, millipoints: i32) -> i32 {
        round(millipoints as f64 * self.zoom * self.screen.y as f64 / MILLIPOINTS_PER_INCH as f64)
    }

    fn x_scale(&self) -> f64 {
        self.zoom * self.screen.x as f64 / self.printer.x as f64
    }

    fn y_scale(&self) -> f64 {
        self.zoom * self.screen.y as f64 / self.printer.y as f64
    }

    pub fn printer_to_screen_x(&self, pixels: i32) -> i32 {
        round(pixels as f64 * self.x_scale())
    }

    pub fn printer_to_screen_y(&self, pixels: i32) -> i32 {
        round(pixels as f64 * self.y_scale())
    }

    pub fn screen_to_printer_x(&self, pixels: i32) -> i32 {
        round(pixels as f64 / self.x_scale())
    }

    pub fn screen_to_printer_y(&self, pixels: i32) -> i32 {
        round(pixels as f64 / self.y_scale())
    }

    pub fn screen_to_printer_point(&self, point: Point) -> Point {
        Point::new(
            self.screen_to_printer_x(point.x),
            self.screen_to_printer_y(point.y),
        )
    }

    /// Converts edges rather than extents so that rectangles sharing an edge
    /// in printer pixels still share it on screen
    pub fn printer_to_screen_rect(&self, rect: Rect) -> Rect {
        let x = self.printer_to_screen_x(rect.x);
        let y = self.printer_to_screen_y(rect.y);
        let right = self.printer_to_screen_x(rect.right());
        let bottom = self.printer_to_screen_y(rect.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}
