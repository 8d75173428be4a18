// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session lifecycle and background upload.

use crate::error::ApiError;
use crate::services::SnapshotCache;
use crate::types::{BackgroundResponse, CreatedSession};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use floorplan_digitizer::{SessionState, SourceImage};
use uuid::Uuid;

/// POST /api/v1/sessions - Start a session.
pub async fn create(State(state): State<AppState>) -> (StatusCode, Json<CreatedSession>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

/// GET /api/v1/sessions/:id - Everything needed to redraw the page.
pub async fn get_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionState>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let session = handle.lock().await;
    Ok(Json(session.state()))
}

/// DELETE /api/v1/sessions/:id - End a session and drop its snapshot.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id).await {
        let key = SnapshotCache::key_for(&id);
        if let Err(e) = state.snapshots.remove(&key).await {
            tracing::warn!(error = %e, key = %key, "Failed to remove snapshot");
        }
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id.to_string()))
    }
}

/// Parts of a background upload.
struct BackgroundUpload {
    data: Vec<u8>,
    name: Option<String>,
    story_height: Option<String>,
}

/// Extract the page and its optional fields from a multipart request.
async fn extract_upload(multipart: &mut Multipart) -> Result<BackgroundUpload, ApiError> {
    let mut data = None;
    let mut name = None;
    let mut story_height = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        tracing::debug!(field_name = %field_name, "Processing multipart field");

        match field_name.as_str() {
            "file" => {
                if name.is_none() {
                    name = field.file_name().map(str::to_string);
                }
                data = Some(field.bytes().await?.to_vec());
            }
            "name" => name = Some(field.text().await?),
            "story_height" => story_height = Some(field.text().await?),
            _ => {}
        }
    }

    let data = data.ok_or_else(|| {
        tracing::warn!("No 'file' field found in multipart request");
        ApiError::MissingFile
    })?;
    Ok(BackgroundUpload {
        data,
        name,
        story_height,
    })
}

/// POST /api/v1/sessions/:id/background - Load a rendered page (PNG/JPEG).
pub async fn upload_background(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<BackgroundResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let upload = extract_upload(&mut multipart).await?;

    if upload.data.len() > state.config.max_upload_mb * 1024 * 1024 {
        return Err(ApiError::FileTooLarge {
            max_mb: state.config.max_upload_mb,
        });
    }

    // Decoding and preprocessing are CPU-bound
    let response = tokio::task::spawn_blocking(move || -> Result<BackgroundResponse, ApiError> {
        let image = SourceImage::decode(&upload.data)?;
        let mut session = handle.blocking_lock();
        let background = session.load_background(upload.name, image);
        let story_height = upload
            .story_height
            .as_deref()
            .map(|input| session.set_story_height(input));
        Ok(BackgroundResponse {
            background,
            story_height,
        })
    })
    .await??;

    Ok(Json(response))
}
