//! Axum router construction for the wall server.
//!
//! Assembles the page and API routes into a single [`Router`], with the
//! static asset directory as the fallback for every other path.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the wall server.
///
/// The router includes:
/// - `GET /` -- grid page
/// - `GET|POST /show_media` -- device media page
/// - `GET /api/session` -- session configuration
/// - `GET /api/sync` -- boundary schedule
/// - everything else -- files under `state.static_dir`
///
/// CORS allows any origin so a dashboard on another host can poll the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        // Pages
        .route("/", get(handlers::index))
        .route(
            "/show_media",
            get(handlers::show_media).post(handlers::show_media),
        )
        // JSON API
        .route("/api/session", get(handlers::get_session))
        .route("/api/sync", get(handlers::get_sync))
        // Static files
        .fallback_service(assets)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
