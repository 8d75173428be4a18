// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polyline drawing, prompts and room list edits.

use crate::error::ApiError;
use crate::types::{
    ClickRequest, DrawingRequest, ModeResponse, PromptAnswer, PromptResolution,
    RecalibrateRequest, RemovedRoom, RoomTypeRequest, ScaleResponse,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use floorplan_digitizer::{
    ClickOutcome, Error as DigitizerError, Point2D, Preview, PromptKind, PromptTicket, RoomType,
};
use uuid::Uuid;

/// POST /api/v1/sessions/:id/drawing - Arm or stop drawing mode.
pub async fn set_drawing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DrawingRequest>,
) -> Result<Json<ModeResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    let dropped_points = if request.armed {
        session.arm_drawing()?;
        0
    } else {
        session.stop_drawing()?
    };
    Ok(Json(ModeResponse {
        mode: session.mode(),
        dropped_points,
    }))
}

/// POST /api/v1/sessions/:id/room-type - Type assigned to rooms closed from now on.
pub async fn set_room_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RoomTypeRequest>,
) -> Result<Json<RoomType>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    session.set_room_type(request.room_type);
    Ok(Json(session.room_type()))
}

/// POST /api/v1/sessions/:id/click - Place a point at a screen position.
pub async fn click(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClickRequest>,
) -> Result<Json<ClickOutcome>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    let outcome = session.click(Point2D::new(request.x, request.y), request.constrain)?;
    Ok(Json(outcome))
}

/// POST /api/v1/sessions/:id/preview - Snap target and rubber band for a pointer position.
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClickRequest>,
) -> Result<Json<Preview>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let session = handle.lock().await;
    let preview = session.preview(Point2D::new(request.x, request.y), request.constrain)?;
    Ok(Json(preview))
}

/// POST /api/v1/sessions/:id/prompts/:ticket - Answer the outstanding prompt.
pub async fn answer_prompt(
    State(state): State<AppState>,
    Path((id, ticket)): Path<(Uuid, u64)>,
    Json(answer): Json<PromptAnswer>,
) -> Result<Json<PromptResolution>, ApiError> {
    let ticket = PromptTicket(ticket);
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;

    let kind = session
        .pending_prompt()
        .filter(|pending| pending.ticket == ticket)
        .map(|pending| pending.kind)
        .ok_or(DigitizerError::UnknownPrompt(ticket))?;

    let resolution = match kind {
        PromptKind::Calibration { .. } => {
            let input = answer.input.ok_or_else(|| {
                ApiError::InvalidRequest("calibration prompt expects `input`".into())
            })?;
            PromptResolution::Calibration(session.resolve_calibration(ticket, &input)?)
        }
        PromptKind::Closure { .. } => {
            let keep = answer.keep.ok_or_else(|| {
                ApiError::InvalidRequest("closure prompt expects `keep`".into())
            })?;
            PromptResolution::Closure(session.resolve_closure(ticket, keep)?)
        }
    };
    Ok(Json(resolution))
}

/// POST /api/v1/sessions/:id/recalibrate - Derive a new scale from a reference segment.
pub async fn recalibrate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecalibrateRequest>,
) -> Result<Json<ScaleResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    let scale = session.recalibrate(request.start, request.end, request.real_length)?;
    Ok(Json(ScaleResponse { scale }))
}

/// POST /api/v1/sessions/:id/abandon - Drop the open polyline.
pub async fn abandon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModeResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    let dropped_points = session.abandon_polyline()?;
    Ok(Json(ModeResponse {
        mode: session.mode(),
        dropped_points,
    }))
}

/// POST /api/v1/sessions/:id/rooms/undo - Remove the most recent room.
pub async fn undo_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemovedRoom>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    let room = session.remove_last_room()?;
    Ok(Json(RemovedRoom {
        room,
        remaining: session.rooms().len(),
    }))
}

/// DELETE /api/v1/sessions/:id/rooms - Remove every room.
pub async fn clear_rooms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = state.sessions.get(&id).await?;
    handle.lock().await.clear_rooms();
    Ok(StatusCode::NO_CONTENT)
}
