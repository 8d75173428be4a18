// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pan, zoom and grid overlay.

use crate::error::ApiError;
use crate::types::{GridLinesQuery, GridRequest, PanRequest, ViewResponse, ZoomRequest};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use floorplan_digitizer::transform::GridLine;
use uuid::Uuid;

/// POST /api/v1/sessions/:id/view/pan
pub async fn pan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PanRequest>,
) -> Result<Json<ViewResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    session.pan_by(request.dx, request.dy)?;
    Ok(Json(ViewResponse {
        view: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/view/zoom - Absolute `zoom` or a wheel `delta_y`.
pub async fn zoom(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ZoomRequest>,
) -> Result<Json<ViewResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    match (request.zoom, request.delta_y) {
        (Some(zoom), _) => session.set_zoom(zoom)?,
        (None, Some(delta_y)) => session.zoom_wheel(delta_y)?,
        (None, None) => {
            return Err(ApiError::InvalidRequest(
                "expected `zoom` or `delta_y`".into(),
            ))
        }
    };
    Ok(Json(ViewResponse {
        view: session.view(),
    }))
}

/// POST /api/v1/sessions/:id/view/grid - Change the grid spacing.
pub async fn set_grid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GridRequest>,
) -> Result<Json<ViewResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let mut session = handle.lock().await;
    session.set_grid_unit_size(request.unit_size)?;
    Ok(Json(ViewResponse {
        view: session.view(),
    }))
}

/// GET /api/v1/sessions/:id/view/grid-lines?width=&height=
pub async fn grid_lines(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<GridLinesQuery>,
) -> Result<Json<Vec<GridLine>>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let session = handle.lock().await;
    Ok(Json(session.grid_lines(query.width, query.height)?))
}
