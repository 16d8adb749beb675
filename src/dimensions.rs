//! Placement geometry for one image request.
//!
//! A [`Dimensions`] value describes where the image goes (origin in terminal
//! cells), how big it may get (target box in pixels), and how it is fitted
//! ([`Scaler`]). The pipeline takes ownership of it and, when centering is
//! enabled, moves the origin so the image is centered on the original anchor.

use crate::types::Scaler;
use serde::{Deserialize, Serialize};

/// Terminal font cell size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl CellSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self {
            width: 8,
            height: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Origin column, in cells.
    pub x: i32,
    /// Origin row, in cells.
    pub y: i32,
    /// Target box width in pixels.
    pub max_width: u32,
    /// Target box height in pixels.
    pub max_height: u32,
    pub scaler: Scaler,
    pub cell: CellSize,
}

impl Dimensions {
    pub fn new(
        x: i32,
        y: i32,
        max_width: u32,
        max_height: u32,
        scaler: Scaler,
        cell: CellSize,
    ) -> Self {
        Self {
            x,
            y,
            max_width,
            max_height,
            scaler,
            cell,
        }
    }

    /// Build from a box measured in terminal cells.
    pub fn from_cells(
        x: i32,
        y: i32,
        max_cols: u32,
        max_rows: u32,
        scaler: Scaler,
        cell: CellSize,
    ) -> Self {
        Self::new(
            x,
            y,
            max_cols.saturating_mul(cell.width),
            max_rows.saturating_mul(cell.height),
            scaler,
            cell,
        )
    }

    pub fn max_box(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    /// Shift the origin left/up by half the image size in cells (floored).
    ///
    /// A zero-sized cell leaves the origin untouched. The shift saturates at
    /// `i32::MIN` instead of wrapping.
    pub fn center_on_origin(&mut self, width: u32, height: u32) {
        if let Some(half_cols) = width.checked_div(self.cell.width.saturating_mul(2)) {
            self.x = self.x.saturating_sub(i32::try_from(half_cols).unwrap_or(i32::MAX));
        }
        if let Some(half_rows) = height.checked_div(self.cell.height.saturating_mul(2)) {
            self.y = self.y.saturating_sub(i32::try_from(half_rows).unwrap_or(i32::MAX));
        }
    }
}
