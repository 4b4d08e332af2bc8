//! Terminal geometry

use serde::{Deserialize, Serialize};

/// Estimated character cell width in pixels, used when deriving geometry
/// from available pixel area
pub const CELL_WIDTH_PX: u32 = 9;

/// Estimated character cell height in pixels
pub const CELL_HEIGHT_PX: u32 = 17;

/// Terminal dimensions as negotiated on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Number of columns
    pub cols: u16,
    /// Number of rows
    pub rows: u16,
}

impl Geometry {
    /// Create a new geometry
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Fallback geometry used before the first resize event (80x30)
    pub fn fallback() -> Self {
        Self { cols: 80, rows: 30 }
    }

    /// Derive geometry from an available pixel area using the fixed
    /// character-cell estimate, clamped to at least one cell each way
    pub fn from_pixels(width_px: u32, height_px: u32) -> Self {
        let cols = (width_px / CELL_WIDTH_PX).clamp(1, u16::MAX as u32) as u16;
        let rows = (height_px / CELL_HEIGHT_PX).clamp(1, u16::MAX as u32) as u16;
        Self { cols, rows }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::fallback()
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}
