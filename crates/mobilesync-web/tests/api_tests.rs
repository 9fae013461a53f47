//! Integration tests for the wall server endpoints.
//!
//! Most tests drive the Axum `Router` directly via `tower::ServiceExt`
//! without starting a TCP server. The last one binds a real socket to
//! check the spawn and graceful-shutdown path.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use mobilesync_core::clock::FixedTimeSource;
use mobilesync_core::session::{ContentMode, SessionConfig, SessionProvider};
use mobilesync_web::router::build_router;
use mobilesync_web::server::ServerConfig;
use mobilesync_web::startup::spawn_server;
use mobilesync_web::state::AppState;
use mobilesync_web::PageRenderer;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::watch;
use tower::ServiceExt;

fn workspace_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join(name)
}

fn make_state(width: i64, height: i64, period: i64, mode: ContentMode) -> Arc<AppState> {
    let session = SessionConfig::new(width, height, period, mode).unwrap();
    let pages = PageRenderer::from_dir(&workspace_dir("templates")).unwrap();
    let state = AppState::new(
        SessionProvider::new(session),
        pages,
        workspace_dir("static"),
    )
    .with_time_source(Arc::new(FixedTimeSource::at_epoch(1000).unwrap()));
    Arc::new(state)
}

fn video_state() -> Arc<AppState> {
    make_state(3, 3, 30, ContentMode::Video)
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: Arc<AppState>, uri: &str) -> axum::response::Response {
    build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(state: Arc<AppState>, uri: &str, form: &str) -> axum::response::Response {
    build_router(state)
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_owned()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn index_has_one_button_per_slot() {
    let response = get(make_state(4, 2, 30, ContentMode::Video), "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_to_string(response.into_body()).await;
    assert_eq!(html.matches("name=\"niddevice\"").count(), 8);
    assert!(html.contains("value=\"0\""));
    assert!(html.contains("value=\"7\""));
    assert!(!html.contains("value=\"8\""));
}

#[tokio::test]
async fn index_form_submits_with_get_so_device_pages_reload_silently() {
    let response = get(video_state(), "/").await;
    let html = body_to_string(response.into_body()).await;

    assert!(html.contains("action=\"/show_media\" method=\"get\""));
    assert!(!html.contains("method=\"post\""));
}

#[tokio::test]
async fn show_media_from_query_string() {
    let response = get(video_state(), "/show_media?niddevice=4").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("<video"));
    assert!(html.contains("data-resync=\"30\""));
    assert!(html.contains("data-row=\"1\""));
    assert!(html.contains("data-column=\"1\""));
}

#[tokio::test]
async fn show_media_from_posted_form() {
    let response = post_form(video_state(), "/show_media", "niddevice=5").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("data-row=\"1\""));
    assert!(html.contains("data-column=\"2\""));
    assert!(html.contains("data-hor-screens=\"3\""));
    assert!(html.contains("data-ver-screens=\"3\""));
}

#[tokio::test]
async fn show_media_rejects_non_integer_id() {
    let response = post_form(video_state(), "/show_media", "niddevice=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("abc"));
}

#[tokio::test]
async fn show_media_requires_an_id() {
    let response = get(video_state(), "/show_media").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn show_media_accepts_ids_outside_the_grid() {
    let response = get(video_state(), "/show_media?niddevice=42").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("outside the 3 x 3 grid"));
    assert!(html.contains("data-row=\"0\""));

    let negative = get(video_state(), "/show_media?niddevice=-1").await;
    assert_eq!(negative.status(), StatusCode::OK);
}

#[tokio::test]
async fn image_walls_render_an_image_without_resync() {
    let response = get(make_state(2, 2, 30, ContentMode::Image), "/show_media?niddevice=3").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("<img"));
    assert!(!html.contains("<video"));
    assert!(!html.contains("scheduleResync"));
}

#[tokio::test]
async fn api_session_describes_the_wall() {
    let response = get(make_state(4, 3, 45, ContentMode::Video), "/api/session").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["grid_width"], 4);
    assert_eq!(json["grid_height"], 3);
    assert_eq!(json["period"], 45);
    assert_eq!(json["content_mode"], "video");
    assert_eq!(json["slots"], 12);
}

#[tokio::test]
async fn api_sync_reports_the_next_boundary() {
    let response = get(video_state(), "/api/sync").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["now"], 1000);
    assert_eq!(json["period"], 30);
    assert_eq!(json["seconds_until_next"], 20);
    assert_eq!(json["next_boundary"], 1020);
    assert_eq!(json["previous_boundary"], 990);
}

#[tokio::test]
async fn static_files_are_served_from_the_asset_dir() {
    let response = get(video_state(), "/js/wall.js").await;
    assert_eq!(response.status(), StatusCode::OK);

    let js = body_to_string(response.into_body()).await;
    assert!(js.contains("msUntilBoundary"));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let response = get(video_state(), "/no/such/file.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn spawned_server_answers_and_shuts_down() {
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = spawn_server(&config, video_state(), shutdown_rx).await.unwrap();

    let mut stream = tokio::net::TcpStream::connect(running.addr).await.unwrap();
    stream
        .write_all(b"GET /api/session HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"));
    assert!(raw.contains("\"grid_width\":3"));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
