// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use floorplan_digitizer::{Point2D, RoomType};
use serde::Deserialize;

/// Pointer position in screen pixels.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl From<ScreenPoint> for Point2D {
    fn from(p: ScreenPoint) -> Self {
        Point2D::new(p.x, p.y)
    }
}

/// Pointer click or move while drawing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClickRequest {
    pub x: f64,
    pub y: f64,
    /// Axis-lock modifier (Shift) held.
    #[serde(default)]
    pub constrain: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DrawingRequest {
    pub armed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomTypeRequest {
    pub room_type: RoomType,
}

/// Operator answer to a prompt.
///
/// Calibration prompts take `input`, closure prompts take `keep`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptAnswer {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub keep: Option<bool>,
}

/// Known real-world length between two drawing-space points.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RecalibrateRequest {
    pub start: Point2D,
    pub end: Point2D,
    pub real_length: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PanRequest {
    pub dx: f64,
    pub dy: f64,
}

/// Absolute zoom, or one wheel notch when only `delta_y` is given.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ZoomRequest {
    #[serde(default)]
    pub zoom: Option<f64>,
    #[serde(default)]
    pub delta_y: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GridRequest {
    pub unit_size: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GridLinesQuery {
    pub width: u32,
    pub height: u32,
}
