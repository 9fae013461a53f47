//! HTTP endpoint handlers for the wall server.
//!
//! All handlers read the immutable session through the shared
//! [`AppState`]. None of them touch the resync clock; devices compute the
//! same boundaries themselves from the period embedded in their page.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Grid of device buttons |
//! | `GET`/`POST` | `/show_media` | Media page for one device (`niddevice` form field) |
//! | `GET` | `/api/session` | Session configuration as JSON |
//! | `GET` | `/api/sync` | Current boundary schedule as JSON |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse};
use mobilesync_core::clock::SyncStatus;
use tracing::{info, warn};

use crate::error::WebError;
use crate::pages::{IndexPage, MediaPage};
use crate::state::AppState;

/// Form fields accepted by `/show_media`.
///
/// Read from the query string on `GET` and from a url-encoded body on
/// `POST`.
#[derive(Debug, serde::Deserialize)]
pub struct ShowMediaForm {
    /// Slot id chosen on the grid page.
    pub niddevice: Option<String>,
}

// ---------------------------------------------------------------------------
// GET / -- grid page
// ---------------------------------------------------------------------------

/// Render one button per grid slot.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    let session = state.session.get();
    let page = IndexPage::for_session(&session);
    Ok(Html(state.pages.render_index(&page)?))
}

// ---------------------------------------------------------------------------
// GET|POST /show_media -- per-device page
// ---------------------------------------------------------------------------

/// Render the media page for the device that picked slot `niddevice`.
///
/// Any integer id is accepted and nothing stops two devices from claiming
/// the same slot. Ids outside the grid are logged and rendered without a
/// tile position.
pub async fn show_media(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ShowMediaForm>,
) -> Result<Html<String>, WebError> {
    let raw = form
        .niddevice
        .ok_or_else(|| WebError::InvalidForm("missing field niddevice".to_owned()))?;
    let nid: i64 = raw.trim().parse().map_err(|e| {
        WebError::InvalidForm(format!("niddevice {raw:?} is not an integer: {e}"))
    })?;

    let session = state.session.get();
    let page = MediaPage::for_device(&session, nid);
    info!(nid, row = ?page.row, column = ?page.column, "new device");
    if !page.in_grid {
        warn!(nid, slots = session.slot_count(), "device id outside the grid");
    }

    Ok(Html(state.pages.render_media(session.content_mode(), &page)?))
}

// ---------------------------------------------------------------------------
// GET /api/session
// ---------------------------------------------------------------------------

/// Return the session configuration.
pub async fn get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.get();
    Json(serde_json::json!({
        "grid_width": session.grid_width(),
        "grid_height": session.grid_height(),
        "period": session.period().as_secs(),
        "content_mode": session.content_mode(),
        "slots": session.slot_count(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/sync
// ---------------------------------------------------------------------------

/// Return the boundary schedule as seen by the server's clock right now.
pub async fn get_sync(State(state): State<Arc<AppState>>) -> Json<SyncStatus> {
    let period = state.session.get().period();
    Json(SyncStatus::at(state.time.epoch_seconds(), period))
}
