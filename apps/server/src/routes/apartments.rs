// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Apartment selection and grouping.

use crate::error::ApiError;
use crate::types::{ModeResponse, ScreenPoint};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use floorplan_digitizer::{Apartment, RoomTag};
use uuid::Uuid;

/// POST /api/v1/sessions/:id/apartments/select - Enter selection mode.
pub async fn begin_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModeResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    session.begin_apartment_selection()?;
    Ok(Json(ModeResponse {
        mode: session.mode(),
        dropped_points: 0,
    }))
}

/// POST /api/v1/sessions/:id/apartments/toggle - Toggle the tag nearest a screen position.
///
/// Returns `null` when no tag is within reach.
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(point): Json<ScreenPoint>,
) -> Result<Json<Option<RoomTag>>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    Ok(Json(session.toggle_tag_at(point.into())?))
}

/// POST /api/v1/sessions/:id/apartments - Group the selected rooms.
pub async fn group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Apartment>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    Ok(Json(session.group_selected()?))
}
