//! Publication and division settings

use crate::geometry::{Dpi, MILLIPOINTS_PER_INCH};
use crate::LayoutError;
use serde::{Deserialize, Serialize};

/// Edge of the sheet the publication is bound on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingEdge {
    #[default]
    Left,
    Top,
}

/// Single or double sided printing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sides {
    Simplex,
    #[default]
    Duplex,
}

/// Where a division begins relative to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartAt {
    #[default]
    NewPage,
    Continuous,
}

/// Overall page geometry shared by every division of a publication
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationGeometry {
    /// Page width in millipoints
    pub page_width: i32,
    /// Page height in millipoints
    pub page_height: i32,
    pub binding_edge: BindingEdge,
    pub sides: Sides,
    pub printer_dpi: Dpi,
    pub screen_dpi: Dpi,
    /// Space between pages on screen, in screen pixels
    pub page_gap: i32,
}

impl Default for PublicationGeometry {
    fn default() -> Self {
        Self {
            page_width: MILLIPOINTS_PER_INCH * 17 / 2, // US Letter
            page_height: MILLIPOINTS_PER_INCH * 11,
            binding_edge: BindingEdge::Left,
            sides: Sides::Duplex,
            printer_dpi: Dpi::uniform(720),
            screen_dpi: Dpi::default(),
            page_gap: 10,
        }
    }
}

impl PublicationGeometry {
    /// Parse geometry from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        let geometry: Self = serde_json::from_str(json)?;
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.page_width <= 0 || self.page_height <= 0 {
            return Err(LayoutError::InvalidPageSize {
                width: self.page_width,
                height: self.page_height,
            });
        }
        for dpi in [self.printer_dpi, self.screen_dpi] {
            if !dpi.is_valid() {
                return Err(LayoutError::InvalidResolution { x: dpi.x, y: dpi.y });
            }
        }
        Ok(())
    }

    pub fn is_left_bound(&self) -> bool {
        self.binding_edge == BindingEdge::Left
    }

    /// Whether the inside margin sits on the left of the given page
    pub fn inside_margin_on_left(&self, page_number: usize) -> bool {
        let odd = self.sides == Sides::Simplex || page_number % 2 == 1;
        odd == self.is_left_bound()
    }
}

/// Page margins of one division, in millipoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: i32,
    pub bottom: i32,
    pub inside: i32,
    pub outside: i32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: MILLIPOINTS_PER_INCH,
            bottom: MILLIPOINTS_PER_INCH,
            inside: MILLIPOINTS_PER_INCH,
            outside: MILLIPOINTS_PER_INCH,
        }
    }
}

impl Margins {
    pub fn uniform(millipoints: i32) -> Self {
        Self {
            top: millipoints,
            bottom: millipoints,
            inside: millipoints,
            outside: millipoints,
        }
    }
}

/// Layout settings of one division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DivisionSettings {
    pub columns: usize,
    /// Space between columns in millipoints
    pub column_gap: i32,
    pub margins: Margins,
    pub start_at: StartAt,
}

impl Default for DivisionSettings {
    fn default() -> Self {
        Self {
            columns: 1,
            column_gap: MILLIPOINTS_PER_INCH / 4,
            margins: Margins::default(),
            start_at: StartAt::NewPage,
        }
    }
}

impl DivisionSettings {
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.columns == 0 {
            return Err(LayoutError::InvalidColumnCount(self.columns));
        }
        Ok(())
    }
}
