// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Screen ↔ drawing space mapping, zoom limits and the grid overlay.
//!
//! Drawing space is the native pixel grid of the rendered page. The view
//! places that page on screen with a pan offset and a uniform zoom:
//!
//! ```text
//! screen = drawing * zoom + pan
//! drawing = (screen - pan) / zoom
//! ```

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Point2D;

/// Smallest accepted zoom factor
pub const MIN_ZOOM: f64 = 0.5;
/// Largest accepted zoom factor
pub const MAX_ZOOM: f64 = 5.0;
/// Smallest grid spacing in screen pixels
pub const MIN_GRID_UNIT: u32 = 10;
/// Largest grid spacing in screen pixels
pub const MAX_GRID_UNIT: u32 = 200;
/// Every n-th grid line is drawn heavier
pub const MAJOR_GRID_EVERY: u32 = 10;

/// Presentational view state: pan offset, zoom and grid spacing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pan_x: f64,
    pan_y: f64,
    zoom: f64,
    grid_unit_size: u32,
}

impl ViewState {
    pub fn new(grid_unit_size: u32) -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
            grid_unit_size: grid_unit_size.clamp(MIN_GRID_UNIT, MAX_GRID_UNIT),
        }
    }

    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    fn pan_vector(&self) -> Vector2<f64> {
        Vector2::new(self.pan_x, self.pan_y)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn grid_unit_size(&self) -> u32 {
        self.grid_unit_size
    }

    /// Move the page by a screen-space delta
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    pub fn set_pan(&mut self, dx: f64, dy: f64) {
        self.pan_x = dx;
        self.pan_y = dy;
    }

    /// Set the zoom, clamped to `[MIN_ZOOM, MAX_ZOOM]`; returns the value applied
    pub fn set_zoom(&mut self, zoom: f64) -> Result<f64> {
        if !zoom.is_finite() {
            return Err(Error::InvalidZoom(zoom));
        }
        self.zoom = clamp_zoom(zoom);
        Ok(self.zoom)
    }

    /// One wheel notch: zoom in for negative `delta_y`, out otherwise
    pub fn zoom_wheel(&mut self, delta_y: f64, step: f64) -> f64 {
        let next = if delta_y < 0.0 {
            self.zoom + step
        } else {
            self.zoom - step
        };
        self.zoom = clamp_zoom(next);
        self.zoom
    }

    /// Change the grid spacing; out-of-range values leave it unchanged
    pub fn set_grid_unit_size(&mut self, size: u32) -> Result<()> {
        if !(MIN_GRID_UNIT..=MAX_GRID_UNIT).contains(&size) {
            return Err(Error::GridSizeOutOfRange(size));
        }
        self.grid_unit_size = size;
        Ok(())
    }

    /// Back to the initial placement (no pan, zoom 1), keeping the grid
    pub fn reset(&mut self) {
        self.set_pan(0.0, 0.0);
        self.zoom = 1.0;
    }

    /// Convert a drawing-space tolerance into one that is constant on screen
    pub fn screen_tolerance(&self, screen_pixels: f64) -> f64 {
        screen_pixels / self.zoom
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(20)
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Map a pointer position to drawing space
pub fn to_drawing_space(screen: Point2D, view: &ViewState) -> Point2D {
    let p = (screen.to_nalgebra().coords - view.pan_vector()) / view.zoom;
    Point2D::new(p.x, p.y)
}

/// Map a drawing-space point to its screen position
pub fn to_screen_space(drawing: Point2D, view: &ViewState) -> Point2D {
    let p = drawing.to_nalgebra().coords * view.zoom + view.pan_vector();
    Point2D::new(p.x, p.y)
}

/// Orientation of a grid line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridAxis {
    Vertical,
    Horizontal,
}

/// One screen-space line of the grid overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub axis: GridAxis,
    /// x for vertical lines, y for horizontal lines
    pub offset: u32,
    pub major: bool,
}

/// Lines of a `width` x `height` screen grid with `unit` pixel spacing
pub fn grid_lines(width: u32, height: u32, unit: u32) -> Vec<GridLine> {
    if unit == 0 {
        return Vec::new();
    }
    let axis_lines = |extent: u32, axis: GridAxis| {
        (0..=extent / unit).map(move |i| GridLine {
            axis,
            offset: i * unit,
            major: i % MAJOR_GRID_EVERY == 0,
        })
    };
    axis_lines(width, GridAxis::Vertical)
        .chain(axis_lines(height, GridAxis::Horizontal))
        .collect()
}
