// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use floorplan_digitizer::Error as DigitizerError;
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing file in request")]
    MissingFile,

    #[error("File too large: maximum size is {max_mb} MB")]
    FileTooLarge { max_mb: usize },

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Digitizer(#[from] DigitizerError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn digitizer_status(err: &DigitizerError) -> (StatusCode, &'static str) {
    use DigitizerError::*;
    match err {
        InvalidDistance(_) => (StatusCode::BAD_REQUEST, "INVALID_DISTANCE"),
        GridSizeOutOfRange(_) => (StatusCode::BAD_REQUEST, "GRID_SIZE_OUT_OF_RANGE"),
        InvalidZoom(_) => (StatusCode::BAD_REQUEST, "INVALID_ZOOM"),
        InvalidImage { .. } => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
        ImageDecode(_) => (StatusCode::UNPROCESSABLE_ENTITY, "IMAGE_DECODE_ERROR"),
        NoBackground => (StatusCode::CONFLICT, "NO_BACKGROUND"),
        DrawingNotArmed => (StatusCode::CONFLICT, "DRAWING_NOT_ARMED"),
        AlreadyDrawing => (StatusCode::CONFLICT, "ALREADY_DRAWING"),
        DrawingActive => (StatusCode::CONFLICT, "DRAWING_ACTIVE"),
        PromptPending(_) => (StatusCode::CONFLICT, "PROMPT_PENDING"),
        NoRooms => (StatusCode::CONFLICT, "NO_ROOMS"),
        NothingSelected => (StatusCode::CONFLICT, "NOTHING_SELECTED"),
        NotSelectingApartment => (StatusCode::CONFLICT, "NOT_SELECTING_APARTMENT"),
        ScaleNotSet => (StatusCode::CONFLICT, "SCALE_NOT_SET"),
        FeatureDisabled(_) => (StatusCode::FORBIDDEN, "FEATURE_DISABLED"),
        UnknownPrompt(_) => (StatusCode::NOT_FOUND, "UNKNOWN_PROMPT"),
        UnknownRoom(_) => (StatusCode::NOT_FOUND, "UNKNOWN_ROOM"),
        SnapshotNotFound(_) => (StatusCode::NOT_FOUND, "SNAPSHOT_NOT_FOUND"),
        Io(_) | Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ApiError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE"),
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MULTIPART_ERROR"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            ApiError::Digitizer(err) => digitizer_status(err),
            ApiError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<cacache::Error> for ApiError {
    fn from(err: cacache::Error) -> Self {
        ApiError::Cache(err.to_string())
    }
}
