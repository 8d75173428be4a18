// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub sessions: usize,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

const fn endpoint(method: &'static str, path: &'static str, description: &'static str) -> EndpointInfo {
    EndpointInfo {
        method,
        path,
        description,
    }
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "floorplan-digitizer-server",
        sessions: state.sessions.len().await,
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "floorplan-digitizer-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Floor plan digitizer backend: rooms, apartments and wall panel export",
        endpoints: vec![
            endpoint("GET", "/", "This endpoint list"),
            endpoint("GET", "/api/v1/health", "Health check endpoint"),
            endpoint("POST", "/api/v1/sessions", "Start a digitizing session"),
            endpoint("GET", "/api/v1/sessions/:id", "Full session state"),
            endpoint("DELETE", "/api/v1/sessions/:id", "End a session and drop its snapshot"),
            endpoint("POST", "/api/v1/sessions/:id/background", "Upload the rendered page (multipart)"),
            endpoint("POST", "/api/v1/sessions/:id/drawing", "Start or stop drawing rooms"),
            endpoint("POST", "/api/v1/sessions/:id/room-type", "Pick the type of the next room"),
            endpoint("POST", "/api/v1/sessions/:id/click", "Place a polyline point"),
            endpoint("POST", "/api/v1/sessions/:id/preview", "Constrained cursor preview"),
            endpoint("POST", "/api/v1/sessions/:id/prompts/:ticket", "Answer a calibration or closure prompt"),
            endpoint("POST", "/api/v1/sessions/:id/recalibrate", "Measure the scale again on the next segment"),
            endpoint("POST", "/api/v1/sessions/:id/abandon", "Drop the polyline in progress"),
            endpoint("DELETE", "/api/v1/sessions/:id/rooms", "Clear all rooms and apartments"),
            endpoint("POST", "/api/v1/sessions/:id/rooms/undo", "Remove the last room"),
            endpoint("POST", "/api/v1/sessions/:id/view/pan", "Pan the view"),
            endpoint("POST", "/api/v1/sessions/:id/view/zoom", "Zoom around a cursor position"),
            endpoint("POST", "/api/v1/sessions/:id/view/grid", "Toggle the grid and set its spacing"),
            endpoint("GET", "/api/v1/sessions/:id/view/grid-lines", "Grid lines for the current view"),
            endpoint("POST", "/api/v1/sessions/:id/apartments", "Group selected rooms into an apartment"),
            endpoint("POST", "/api/v1/sessions/:id/apartments/select", "Start selecting rooms for an apartment"),
            endpoint("POST", "/api/v1/sessions/:id/apartments/toggle", "Select or deselect a room"),
            endpoint("GET", "/api/v1/sessions/:id/export", "Download the panels/rooms BOM"),
            endpoint("POST", "/api/v1/sessions/:id/snapshot", "Save rooms locally"),
            endpoint("POST", "/api/v1/sessions/:id/snapshot/restore", "Restore saved rooms"),
        ],
    })
}
