// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use floorplan_digitizer::{
    BackgroundInfo, CalibrationOutcome, ClosureOutcome, InteractionMode, RoomId, ScaleFactor,
    StoryHeight, ViewState,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSession {
    pub session_id: Uuid,
}

/// Result of loading a background page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundResponse {
    pub background: BackgroundInfo,
    /// Present when a story height was supplied with the upload.
    pub story_height: Option<StoryHeight>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeResponse {
    pub mode: InteractionMode,
    /// Points of an open polyline dropped by the mode change.
    pub dropped_points: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub view: ViewState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleResponse {
    pub scale: ScaleFactor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedRoom {
    pub room: RoomId,
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub key: String,
    pub rooms: usize,
}

/// Answer to whichever prompt was outstanding.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PromptResolution {
    Calibration(CalibrationOutcome),
    Closure(ClosureOutcome),
}
