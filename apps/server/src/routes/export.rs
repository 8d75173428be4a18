// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BOM download and local room snapshots.

use crate::error::ApiError;
use crate::services::SnapshotCache;
use crate::types::SnapshotResponse;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use floorplan_digitizer::Error as DigitizerError;
use uuid::Uuid;

/// GET /api/v1/sessions/:id/export - Download the panels/rooms document.
pub async fn export_bom(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let (json, file_name) = {
        let session = handle.lock().await;
        let document = session.export_bom()?;
        (document.to_pretty_json()?, session.bom_file_name())
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(Body::from(json))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// POST /api/v1/sessions/:id/snapshot - Save the current rooms.
pub async fn save_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let (json, rooms) = {
        let session = handle.lock().await;
        (session.snapshot_json()?, session.rooms().len())
    };

    let key = SnapshotCache::key_for(&id);
    state.snapshots.set(&key, &json).await?;
    tracing::info!(session = %id, rooms, "Saved snapshot");
    Ok(Json(SnapshotResponse { key, rooms }))
}

/// POST /api/v1/sessions/:id/snapshot/restore - Replace rooms with the saved ones.
pub async fn restore_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let key = SnapshotCache::key_for(&id);
    let json = state
        .snapshots
        .get(&key)
        .await?
        .ok_or_else(|| DigitizerError::SnapshotNotFound(key.clone()))?;

    let rooms = handle.lock().await.restore_snapshot_json(&json)?;
    Ok(Json(SnapshotResponse { key, rooms }))
}
