// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor plan digitizer server - local backend for the digitizer page.
//!
//! Each page load starts a session that owns one drawing: the rendered
//! background, the rooms traced on it, apartments and the scale. The page
//! forwards pointer events and prompt answers; the server applies them in
//! order and returns the resulting state.
//!
//! # Endpoints
//!
//! - `GET /` - Every endpoint this server mounts
//! - `GET /api/v1/health` - Health check
//! - `POST /api/v1/sessions` - Start a session
//! - `POST /api/v1/sessions/:id/background` - Upload the rendered page
//! - `POST /api/v1/sessions/:id/click` - Place a polyline point
//! - `POST /api/v1/sessions/:id/prompts/:ticket` - Answer a prompt
//! - `POST /api/v1/sessions/:id/apartments` - Group selected rooms
//! - `GET /api/v1/sessions/:id/export` - Download the BOM document
//! - `POST /api/v1/sessions/:id/snapshot` - Save rooms to the local store

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::{SessionRegistry, SnapshotCache};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub snapshots: Arc<SnapshotCache>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Self {
        Self {
            sessions: SessionRegistry::new(
                config.digitizer.clone(),
                Duration::from_secs(config.session_ttl_secs),
                config.max_sessions,
            ),
            snapshots: Arc::new(SnapshotCache::new(&config.cache_dir).await),
            config: Arc::new(config),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()),
        ))
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION])
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        .route("/api/v1/health", get(routes::health::check))
        // Session lifecycle
        .route("/api/v1/sessions", post(routes::sessions::create))
        .route(
            "/api/v1/sessions/:id",
            get(routes::sessions::get_state).delete(routes::sessions::delete),
        )
        .route("/api/v1/sessions/:id/background", post(routes::sessions::upload_background))
        // Drawing
        .route("/api/v1/sessions/:id/drawing", post(routes::drawing::set_drawing))
        .route("/api/v1/sessions/:id/room-type", post(routes::drawing::set_room_type))
        .route("/api/v1/sessions/:id/click", post(routes::drawing::click))
        .route("/api/v1/sessions/:id/preview", post(routes::drawing::preview))
        .route("/api/v1/sessions/:id/prompts/:ticket", post(routes::drawing::answer_prompt))
        .route("/api/v1/sessions/:id/recalibrate", post(routes::drawing::recalibrate))
        .route("/api/v1/sessions/:id/abandon", post(routes::drawing::abandon))
        .route("/api/v1/sessions/:id/rooms", axum::routing::delete(routes::drawing::clear_rooms))
        .route("/api/v1/sessions/:id/rooms/undo", post(routes::drawing::undo_room))
        // View
        .route("/api/v1/sessions/:id/view/pan", post(routes::view::pan))
        .route("/api/v1/sessions/:id/view/zoom", post(routes::view::zoom))
        .route("/api/v1/sessions/:id/view/grid", post(routes::view::set_grid))
        .route("/api/v1/sessions/:id/view/grid-lines", get(routes::view::grid_lines))
        // Apartments
        .route("/api/v1/sessions/:id/apartments", post(routes::apartments::group))
        .route("/api/v1/sessions/:id/apartments/select", post(routes::apartments::begin_selection))
        .route("/api/v1/sessions/:id/apartments/toggle", post(routes::apartments::toggle))
        // Export and snapshots
        .route("/api/v1/sessions/:id/export", get(routes::export::export_bom))
        .route("/api/v1/sessions/:id/snapshot", post(routes::export::save_snapshot))
        .route("/api/v1/sessions/:id/snapshot/restore", post(routes::export::restore_snapshot))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_upload_mb * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "info,tower_http=debug,floorplan_digitizer_server=debug,floorplan_digitizer=debug".into()
        }))
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        cache_dir = %config.cache_dir,
        max_upload_mb = config.max_upload_mb,
        session_ttl_secs = config.session_ttl_secs,
        max_sessions = config.max_sessions,
        snap_radius = config.digitizer.snap_radius,
        story_height = config.digitizer.default_story_height,
        apartments = config.digitizer.features.apartment_grouping,
        grid = config.digitizer.features.grid_overlay,
        preprocessing = config.digitizer.features.image_preprocessing,
        "Starting floor plan digitizer server"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config).await;

    // Sweep idle sessions at a fraction of the TTL
    let sessions = state.sessions.clone();
    let sweep = Duration::from_secs((state.config.session_ttl_secs / 4).clamp(1, 300));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep);
        loop {
            interval.tick().await;
            sessions.evict_idle().await;
        }
    });

    let app = router(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use floorplan_digitizer::DigitizerConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "digitizer-test-boundary";

    async fn test_app(cache_dir: &std::path::Path) -> Router {
        let config = Config {
            port: 0,
            cache_dir: cache_dir.to_string_lossy().into_owned(),
            max_upload_mb: 5,
            request_timeout_secs: 30,
            session_ttl_secs: 3600,
            max_sessions: 16,
            cors_origins: vec!["*".into()],
            digitizer: DigitizerConfig::default(),
        };
        router(AppState::new(config).await)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn blank_png() -> Vec<u8> {
        let page = image::RgbaImage::from_pixel(200, 200, image::Rgba([255, 255, 255, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(page)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn upload_request(uri: &str, png: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"plan.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(png);
        body.extend_from_slice(
            format!(
                "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"story_height\"\r\n\r\n2.75\r\n--{BOUNDARY}--\r\n"
            )
            .as_bytes(),
        );
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn new_session(app: &Router) -> String {
        let (status, created) = send(app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        format!("/api/v1/sessions/{}", created["session_id"].as_str().unwrap())
    }

    async fn upload_page(app: &Router, base: &str) -> Value {
        let response = app
            .clone()
            .oneshot(upload_request(&format!("{base}/background"), &blank_png()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn click(app: &Router, base: &str, x: f64, y: f64) -> Value {
        let (status, outcome) = send(
            app,
            Method::POST,
            &format!("{base}/click"),
            Some(json!({ "x": x, "y": y })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{outcome}");
        outcome
    }

    #[tokio::test]
    async fn health_reports_session_count() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;
        new_session(&app).await;

        let (status, health) = send(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["sessions"], 1);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn drawing_requires_background() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;
        let base = new_session(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{base}/drawing"),
            Some(json!({ "armed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "NO_BACKGROUND");

        let (status, body) = send(&app, Method::GET, &format!("{base}/export"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "NO_ROOMS");
    }

    #[tokio::test]
    async fn full_drawing_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;
        let base = new_session(&app).await;

        let loaded = upload_page(&app, &base).await;
        assert_eq!(loaded["background"]["name"], "plan.png");
        assert_eq!(loaded["background"]["width"], 200);
        assert_eq!(loaded["story_height"]["value"], 2.75);

        let (status, mode) = send(
            &app,
            Method::POST,
            &format!("{base}/drawing"),
            Some(json!({ "armed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mode["mode"], "drawing");

        // First segment: 100 px drawn, 5 m real
        click(&app, &base, 10.0, 10.0).await;
        let prompt = click(&app, &base, 110.0, 10.0).await;
        assert_eq!(prompt["outcome"], "prompt");
        assert_eq!(prompt["kind"], "calibration");
        let ticket = prompt["ticket"].as_u64().unwrap();

        let prompts = format!("{base}/prompts/{ticket}");
        let (status, body) = send(&app, Method::POST, &prompts, Some(json!({ "keep": true }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let (status, calibrated) =
            send(&app, Method::POST, &prompts, Some(json!({ "input": "5" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(calibrated["outcome"], "calibrated");

        click(&app, &base, 110.0, 110.0).await;
        click(&app, &base, 10.0, 110.0).await;
        let closing = click(&app, &base, 10.0, 10.0).await;
        assert_eq!(closing["kind"], "closure");
        let ticket = closing["ticket"].as_u64().unwrap();

        let (status, kept) = send(
            &app,
            Method::POST,
            &format!("{base}/prompts/{ticket}"),
            Some(json!({ "keep": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(kept["outcome"], "kept");

        // Answered prompts are gone
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{base}/prompts/{ticket}"),
            Some(json!({ "keep": true })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "UNKNOWN_PROMPT");

        let (status, state) = send(&app, Method::GET, &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state["rooms"].as_array().unwrap().len(), 1);
        assert_eq!(state["tags"].as_array().unwrap().len(), 1);
        assert_eq!(state["room_summaries"][0]["segment_lengths"], json!([5.0, 5.0, 5.0, 5.0]));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("{base}/export"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"plan_bom.json\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let bom: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(bom["panels"]["max_key"], 4);
        assert_eq!(bom["panels"]["items"]["1"]["height"], 2.75);
        assert_eq!(bom["panels"]["items"]["1"]["apartment"], "N/A");

        // Snapshot survives clearing the rooms
        let (status, saved) = send(&app, Method::POST, &format!("{base}/snapshot"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["rooms"], 1);

        let (status, _) = send(&app, Method::DELETE, &format!("{base}/rooms"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, restored) =
            send(&app, Method::POST, &format!("{base}/snapshot/restore"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(restored["rooms"], 1);
    }

    #[tokio::test]
    async fn view_is_locked_while_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;
        let base = new_session(&app).await;
        upload_page(&app, &base).await;

        let (status, view) = send(
            &app,
            Method::POST,
            &format!("{base}/view/zoom"),
            Some(json!({ "zoom": 2.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["view"]["zoom"], 2.0);

        send(
            &app,
            Method::POST,
            &format!("{base}/drawing"),
            Some(json!({ "armed": true })),
        )
        .await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{base}/view/pan"),
            Some(json!({ "dx": 5.0, "dy": 5.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DRAWING_ACTIVE");
    }

    #[tokio::test]
    async fn every_listed_endpoint_is_routed() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;
        let (_, info) = send(&app, Method::GET, "/", None).await;
        let endpoints = info["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), 25);

        let id = uuid::Uuid::new_v4().to_string();
        for endpoint in endpoints {
            let method: Method = endpoint["method"].as_str().unwrap().parse().unwrap();
            let path = endpoint["path"]
                .as_str()
                .unwrap()
                .replace(":id", &id)
                .replace(":ticket", "1");
            let request = Request::builder()
                .method(method.clone())
                .uri(&path)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            // Unrouted requests come back as an empty 404 or a 405
            assert_ne!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {path}");
            assert!(
                status != StatusCode::NOT_FOUND || !bytes.is_empty(),
                "{method} {path} is not routed"
            );
        }
    }

    #[tokio::test]
    async fn restore_without_snapshot_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path()).await;
        let base = new_session(&app).await;
        let (status, body) =
            send(&app, Method::POST, &format!("{base}/snapshot/restore"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SNAPSHOT_NOT_FOUND");
    }
}
